//! Aggregation levels and rollups

use std::fmt;

use kshetra_core::{Metrics, RegionId, RegionNode, ReportKind, SummaryItem};
use serde::Serialize;

/// Metric sums over a set of summary rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rollup(Metrics);

impl Rollup {
    /// Sum every metric over `rows`
    pub fn from_rows(rows: &[SummaryItem]) -> Self {
        let mut totals = Metrics::new();
        for row in rows {
            for (key, value) in &row.metrics {
                let slot = totals.entry(key.clone()).or_insert(0);
                *slot = slot.saturating_add(*value);
            }
        }
        Self(totals)
    }

    /// The total for `key`, zero when no row reports it
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// The headline total for a report kind
    pub fn headline(&self, kind: ReportKind) -> u64 {
        self.get(kind.headline_metric())
    }

    /// All totals by metric name
    pub fn metrics(&self) -> &Metrics {
        &self.0
    }

    /// Check if no metric was summed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Rollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// One level of the drill-down stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationLevel {
    /// Position in the stack, 0 for the root
    pub index: usize,
    /// The region whose children this level lists
    pub region: RegionNode,
    /// Summary rows for the region's children
    pub rows: Vec<SummaryItem>,
    pub loaded: bool,
    pub loading: bool,
    /// The row most recently expanded from this level
    pub expanded_row: Option<RegionId>,
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl AggregationLevel {
    pub(crate) fn new(index: usize, region: RegionNode, generation: u64) -> Self {
        Self {
            index,
            region,
            rows: Vec::new(),
            loaded: false,
            loading: false,
            expanded_row: None,
            generation,
        }
    }

    /// Totals over this level's rows
    pub fn total(&self) -> Rollup {
        Rollup::from_rows(&self.rows)
    }

    /// The row for `region`, if listed
    pub fn row(&self, region: RegionId) -> Option<&SummaryItem> {
        self.rows.iter().find(|r| r.region_id == region)
    }

    /// Rows that can be expanded further
    pub fn clickable_rows(&self) -> impl Iterator<Item = &SummaryItem> {
        self.rows.iter().filter(|r| r.is_clickable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kshetra_core::RegionType;

    fn rows() -> Vec<SummaryItem> {
        vec![
            SummaryItem::new(4u64, "Nagar 4", RegionType::Nagar)
                .with_metric("team_count", 3)
                .with_metric("total_tolies", 1),
            SummaryItem::new(5u64, "Nagar 5", RegionType::Nagar).with_metric("team_count", 5),
            SummaryItem::new(6u64, "Basti 6", RegionType::Basti),
        ]
    }

    #[test]
    fn test_rollup_sums_each_metric() {
        let total = Rollup::from_rows(&rows());
        assert_eq!(total.get("team_count"), 8);
        assert_eq!(total.get("total_tolies"), 1);
        assert_eq!(total.get("missing"), 0);
        assert_eq!(total.headline(ReportKind::Team), 1);
        assert_eq!(format!("{}", total), "team_count=8, total_tolies=1");
    }

    #[test]
    fn test_empty_rollup() {
        let total = Rollup::from_rows(&[]);
        assert!(total.is_empty());
        assert_eq!(total.headline(ReportKind::Household), 0);
    }

    #[test]
    fn test_level_rows() {
        let mut level = AggregationLevel::new(
            1,
            RegionNode::new(3u64, "Jila 3", RegionType::Jila, None),
            1,
        );
        level.rows = rows();

        assert_eq!(level.total().get("team_count"), 8);
        assert!(level.row(RegionId(5)).is_some());
        assert!(level.row(RegionId(7)).is_none());
        assert_eq!(level.clickable_rows().count(), 2);
    }

    #[test]
    fn test_level_serializes_without_generation() {
        let level = AggregationLevel::new(
            0,
            RegionNode::new(1u64, "Haryana", RegionType::Prant, None),
            9,
        );
        let json = serde_json::to_string(&level).unwrap();
        assert!(!json.contains("generation"));
        assert!(json.contains(r#""expanded_row":null"#));
    }
}
