//! Drill-down aggregation
//!
//! The [`DrillDownAggregator`] keeps a contiguous stack of levels. Level 0
//! lists the children of the report root; each further level lists the
//! children of the row expanded on the level above it. Expanding a row on
//! level `i` drops every level below `i` before appending the new one.
//!
//! Rows are fetched lazily, one level at a time. A fetch that comes back
//! after its level was replaced is discarded.

use kshetra_core::{
    RegionId, RegionNode, ReportError, ReportKind, SummaryItem, SummaryProvider,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::level::{AggregationLevel, Rollup};
use crate::navigation::{Crumb, NavigationPathTracker};

/// Result of an expand or load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Rows for the level at `index` were fetched (possibly empty)
    Loaded { index: usize },
    /// Terminal regions have nothing below them
    NotExpandable,
    /// The level was replaced before its rows arrived
    Superseded,
}

/// Everything a report view renders, re-emitted on every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSnapshot {
    pub kind: ReportKind,
    pub levels: Vec<AggregationLevel>,
    pub breadcrumb: Vec<Crumb>,
    pub current_total: Rollup,
    pub root_total: Rollup,
    pub focus: Option<usize>,
}

impl ReportSnapshot {
    fn capture(kind: ReportKind, inner: &Inner) -> Self {
        Self {
            kind,
            levels: inner.levels.clone(),
            breadcrumb: NavigationPathTracker::breadcrumb(&inner.levels),
            current_total: inner.levels.last().map(|l| l.total()).unwrap_or_default(),
            root_total: inner.levels.first().map(|l| l.total()).unwrap_or_default(),
            focus: inner.tracker.pending_focus(),
        }
    }
}

struct Inner {
    levels: Vec<AggregationLevel>,
    tracker: NavigationPathTracker,
    next_generation: u64,
}

impl Inner {
    fn next_generation(&mut self) -> u64 {
        self.next_generation = self.next_generation.wrapping_add(1);
        self.next_generation
    }
}

/// Level-by-level drill-down over a summary provider
pub struct DrillDownAggregator<S> {
    provider: S,
    kind: ReportKind,
    inner: Mutex<Inner>,
    snapshot_tx: watch::Sender<ReportSnapshot>,
}

impl<S: SummaryProvider> DrillDownAggregator<S> {
    /// Create an aggregator rooted at `root`; call [`load_root`](Self::load_root) to fetch it
    pub fn new(provider: S, kind: ReportKind, root: RegionNode) -> Self {
        let inner = Inner {
            levels: vec![AggregationLevel::new(0, root, 1)],
            tracker: NavigationPathTracker::new(),
            next_generation: 1,
        };
        let (snapshot_tx, _) = watch::channel(ReportSnapshot::capture(kind, &inner));
        Self {
            provider,
            kind,
            inner: Mutex::new(inner),
            snapshot_tx,
        }
    }

    /// The report kind
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// Fetch (or refetch) the root level's rows
    pub async fn load_root(&self) -> ExpandOutcome {
        let (region, generation) = {
            let mut inner = self.inner.lock();
            inner.levels.truncate(1);
            let generation = inner.next_generation();
            inner.tracker.on_truncate(1);
            let root = &mut inner.levels[0];
            root.generation = generation;
            root.expanded_row = None;
            root.loading = true;
            root.loaded = false;
            let region = root.region.id;
            self.publish(&inner);
            (region, generation)
        };
        self.fetch(0, region, generation).await
    }

    /// Expand `child` from the level at `level_index`
    ///
    /// Levels below `level_index` are dropped and a new level listing the
    /// child's rows is appended. Expanding a terminal region does nothing.
    pub async fn expand(
        &self,
        level_index: usize,
        child: RegionNode,
    ) -> Result<ExpandOutcome, ReportError> {
        if child.is_terminal() {
            trace!(region_id = %child.id, kind = %child.kind, "terminal region, not expandable");
            return Ok(ExpandOutcome::NotExpandable);
        }

        let (index, region, generation) = {
            let mut inner = self.inner.lock();
            let len = inner.levels.len();
            let parent = inner
                .levels
                .get(level_index)
                .map(|l| l.region.clone())
                .ok_or(ReportError::LevelOutOfRange {
                    index: level_index,
                    len,
                })?;

            let linked = child.parent_id.is_none_or(|p| p == parent.id);
            if !linked || !parent.kind.children().contains(&child.kind) {
                return Err(ReportError::NotAChild {
                    child: child.id,
                    parent: parent.id,
                });
            }

            inner.levels.truncate(level_index + 1);
            inner.levels[level_index].expanded_row = Some(child.id);
            let generation = inner.next_generation();
            let index = level_index + 1;

            let mut region = child;
            region.parent_id = Some(parent.id);
            let region_id = region.id;
            let mut level = AggregationLevel::new(index, region, generation);
            level.loading = true;
            inner.levels.push(level);
            inner.tracker.on_truncate(index);
            inner.tracker.on_expand(index);

            debug!(level = index, region_id = %region_id, generation, "level expanded");
            self.publish(&inner);
            (index, region_id, generation)
        };

        Ok(self.fetch(index, region, generation).await)
    }

    /// Expand the row for `region` listed on the level at `level_index`
    pub async fn expand_row(
        &self,
        level_index: usize,
        region: RegionId,
    ) -> Result<ExpandOutcome, ReportError> {
        let child = {
            let inner = self.inner.lock();
            let level = inner
                .levels
                .get(level_index)
                .ok_or(ReportError::LevelOutOfRange {
                    index: level_index,
                    len: inner.levels.len(),
                })?;
            let row = level.row(region).ok_or(ReportError::RowNotFound {
                level: level_index,
                region,
            })?;
            row.to_region(level.region.id)
        };
        self.expand(level_index, child).await
    }

    /// Drop every level below `level_index` and clear its expanded row
    pub fn collapse(&self, level_index: usize) -> Result<(), ReportError> {
        let mut inner = self.inner.lock();
        let len = inner.levels.len();
        if level_index >= len {
            return Err(ReportError::LevelOutOfRange {
                index: level_index,
                len,
            });
        }
        inner.levels.truncate(level_index + 1);
        inner.levels[level_index].expanded_row = None;
        inner.tracker.on_truncate(level_index + 1);
        debug!(level = level_index, "collapsed");
        self.publish(&inner);
        Ok(())
    }

    /// Snapshot of the stack
    pub fn levels(&self) -> Vec<AggregationLevel> {
        self.inner.lock().levels.clone()
    }

    /// The level at `index`
    pub fn level(&self, index: usize) -> Option<AggregationLevel> {
        self.inner.lock().levels.get(index).cloned()
    }

    /// Number of levels on the stack
    pub fn depth(&self) -> usize {
        self.inner.lock().levels.len()
    }

    /// Totals over the deepest level's rows
    pub fn current_total(&self) -> Rollup {
        self.inner
            .lock()
            .levels
            .last()
            .map(|l| l.total())
            .unwrap_or_default()
    }

    /// Totals over the root level's rows
    pub fn root_total(&self) -> Rollup {
        self.inner
            .lock()
            .levels
            .first()
            .map(|l| l.total())
            .unwrap_or_default()
    }

    /// Totals over the rows of the level at `index`
    pub fn level_total(&self, index: usize) -> Option<Rollup> {
        self.inner.lock().levels.get(index).map(|l| l.total())
    }

    /// Headline count of the deepest level
    pub fn headline_total(&self) -> u64 {
        self.current_total().headline(self.kind)
    }

    /// Breadcrumb from the root to the deepest level
    pub fn breadcrumb(&self) -> Vec<Crumb> {
        NavigationPathTracker::breadcrumb(&self.inner.lock().levels)
    }

    /// Region ids to highlight
    pub fn path_ids(&self) -> Vec<RegionId> {
        NavigationPathTracker::path_ids(&self.inner.lock().levels)
    }

    /// Consume the request to focus a newly expanded level
    pub fn take_focus(&self) -> Option<usize> {
        let mut inner = self.inner.lock();
        let focus = inner.tracker.take_focus();
        if focus.is_some() {
            self.publish(&inner);
        }
        focus
    }

    /// Watch report snapshots
    pub fn subscribe(&self) -> watch::Receiver<ReportSnapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn fetch(&self, index: usize, region: RegionId, generation: u64) -> ExpandOutcome {
        let rows: Vec<SummaryItem> = match self.provider.summary(self.kind, region).await {
            Ok(rows) => rows,
            Err(error) => {
                warn!(level = index, region_id = %region, error = %error, "summary fetch failed, showing empty level");
                Vec::new()
            }
        };

        let mut inner = self.inner.lock();
        let Some(level) = inner
            .levels
            .get_mut(index)
            .filter(|l| l.generation == generation)
        else {
            trace!(level = index, generation, "dropping stale summary rows");
            return ExpandOutcome::Superseded;
        };

        level.rows = rows;
        level.loaded = true;
        level.loading = false;
        debug!(level = index, region_id = %region, rows = level.rows.len(), "level loaded");
        self.publish(&inner);
        ExpandOutcome::Loaded { index }
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot_tx
            .send_replace(ReportSnapshot::capture(self.kind, inner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kshetra_core::{InMemorySummaryProvider, RegionType};

    fn aggregator() -> DrillDownAggregator<InMemorySummaryProvider> {
        let p = InMemorySummaryProvider::new();
        p.set_rows(
            ReportKind::Team,
            RegionId(1),
            vec![
                SummaryItem::new(10u64, "Rohtak", RegionType::Vibhag).with_metric("total_tolies", 4),
                SummaryItem::new(11u64, "Hisar", RegionType::Vibhag).with_metric("total_tolies", 2),
            ],
        );
        DrillDownAggregator::new(
            p,
            ReportKind::Team,
            RegionNode::new(1u64, "Haryana", RegionType::Prant, None),
        )
    }

    #[tokio::test]
    async fn test_new_stack_has_unloaded_root() {
        let agg = aggregator();
        let root = agg.level(0).unwrap();
        assert_eq!(agg.depth(), 1);
        assert!(!root.loaded);
        assert!(!root.loading);
        assert!(agg.current_total().is_empty());
    }

    #[tokio::test]
    async fn test_load_root() {
        let agg = aggregator();
        assert_eq!(agg.load_root().await, ExpandOutcome::Loaded { index: 0 });

        let root = agg.level(0).unwrap();
        assert!(root.loaded);
        assert!(!root.loading);
        assert_eq!(root.rows.len(), 2);
        assert_eq!(agg.headline_total(), 6);
        assert_eq!(agg.root_total(), agg.current_total());
    }

    #[tokio::test]
    async fn test_out_of_range() {
        let agg = aggregator();
        let child = RegionNode::new(10u64, "Rohtak", RegionType::Vibhag, Some(RegionId(1)));
        assert_eq!(
            agg.expand(3, child).await,
            Err(ReportError::LevelOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(
            agg.collapse(1),
            Err(ReportError::LevelOutOfRange { index: 1, len: 1 })
        );
    }

    #[tokio::test]
    async fn test_expand_row_needs_a_listed_row() {
        let agg = aggregator();
        agg.load_root().await;
        assert_eq!(
            agg.expand_row(0, RegionId(99)).await,
            Err(ReportError::RowNotFound {
                level: 0,
                region: RegionId(99)
            })
        );
    }

    #[tokio::test]
    async fn test_take_focus_republishes() {
        let agg = aggregator();
        agg.load_root().await;
        agg.expand_row(0, RegionId(10)).await.unwrap();

        let rx = agg.subscribe();
        assert_eq!(rx.borrow().focus, Some(1));
        assert_eq!(agg.take_focus(), Some(1));
        assert_eq!(rx.borrow().focus, None);
        assert_eq!(agg.take_focus(), None);
    }
}
