//! Report kinds and per-region summary rows

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::region::{RegionId, RegionNode, RegionType};

/// Named counts attached to a summary row
pub type Metrics = BTreeMap<String, u64>;

/// The kind of record a report rolls up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Toli (volunteer team) counts
    #[default]
    #[serde(alias = "toli")]
    Team,
    /// Parivar (household visit) counts
    #[serde(alias = "parivar")]
    Household,
    /// Utsuk (lead) counts
    #[serde(alias = "utsuk")]
    Lead,
}

impl ReportKind {
    /// All report kinds
    pub const ALL: [ReportKind; 3] = [ReportKind::Team, ReportKind::Household, ReportKind::Lead];

    /// The metric shown as the headline count for a row
    pub fn headline_metric(self) -> &'static str {
        match self {
            ReportKind::Team => "total_tolies",
            ReportKind::Household => "total_families",
            ReportKind::Lead => "utsuk_count",
        }
    }

    /// Metrics a backend is expected to report for this kind
    pub fn metric_keys(self) -> &'static [&'static str] {
        match self {
            ReportKind::Team => &["total_tolies"],
            ReportKind::Household => &[
                "total_families",
                "total_contacted",
                "male_count",
                "female_count",
                "kids_count",
            ],
            ReportKind::Lead => &["utsuk_count"],
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Team => write!(f, "team"),
            ReportKind::Household => write!(f, "household"),
            ReportKind::Lead => write!(f, "lead"),
        }
    }
}

/// One row of a report: a child region and its counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub region_id: RegionId,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: RegionType,
    #[serde(default)]
    pub metrics: Metrics,
}

impl SummaryItem {
    /// Create a row with no metrics
    pub fn new(region_id: impl Into<RegionId>, label: impl Into<String>, kind: RegionType) -> Self {
        Self {
            region_id: region_id.into(),
            label: label.into(),
            kind,
            metrics: Metrics::new(),
        }
    }

    /// Add a metric
    pub fn with_metric(mut self, key: impl Into<String>, value: u64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// A metric value, zero when absent
    pub fn metric(&self, key: &str) -> u64 {
        self.metrics.get(key).copied().unwrap_or(0)
    }

    /// Rows at terminal levels cannot be drilled into
    pub fn is_clickable(&self) -> bool {
        !self.kind.is_terminal()
    }

    /// The region this row describes, as a child of `parent`
    ///
    /// Summary rows carry no region code, so the code is left empty.
    pub fn to_region(&self, parent: RegionId) -> RegionNode {
        RegionNode::new(self.region_id, self.label.clone(), self.kind, Some(parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_aliases() {
        let kind: ReportKind = serde_json::from_str(r#""parivar""#).unwrap();
        assert_eq!(kind, ReportKind::Household);
        let kind: ReportKind = serde_json::from_str(r#""lead""#).unwrap();
        assert_eq!(kind, ReportKind::Lead);
        assert_eq!(serde_json::to_string(&ReportKind::Team).unwrap(), r#""team""#);
    }

    #[test]
    fn test_headline_is_a_metric_key() {
        for kind in ReportKind::ALL {
            assert!(kind.metric_keys().contains(&kind.headline_metric()));
        }
    }

    #[test]
    fn test_summary_item_metrics() {
        let item = SummaryItem::new(10u64, "Rohtak Vibhag", RegionType::Vibhag)
            .with_metric("total_tolies", 4);
        assert_eq!(item.metric("total_tolies"), 4);
        assert_eq!(item.metric("missing"), 0);
        assert!(item.is_clickable());

        let region = item.to_region(RegionId(1));
        assert_eq!(region.parent_id, Some(RegionId(1)));
        assert_eq!(region.kind, RegionType::Vibhag);
    }

    #[test]
    fn test_terminal_rows_not_clickable() {
        assert!(!SummaryItem::new(90u64, "Model Town", RegionType::Basti).is_clickable());
        assert!(!SummaryItem::new(91u64, "Kheri", RegionType::Gram).is_clickable());
        assert!(SummaryItem::new(92u64, "Sampla", RegionType::Mandal).is_clickable());
    }
}
