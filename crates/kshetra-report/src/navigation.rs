//! Breadcrumbs and focus for the drill-down stack

use std::fmt;

use kshetra_core::{RegionId, RegionType};
use serde::Serialize;

use crate::level::AggregationLevel;

/// One breadcrumb entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub index: usize,
    pub region_id: RegionId,
    pub kind: RegionType,
    pub name: String,
}

impl fmt::Display for Crumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.region_id)
    }
}

/// Derives the breadcrumb and highlighted path from the stack, and holds
/// the one-shot request to focus a newly expanded level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationPathTracker {
    pending_focus: Option<usize>,
}

impl NavigationPathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Breadcrumb from the root level to the current one
    pub fn breadcrumb(levels: &[AggregationLevel]) -> Vec<Crumb> {
        levels
            .iter()
            .map(|level| Crumb {
                index: level.index,
                region_id: level.region.id,
                kind: level.region.kind,
                name: level.region.name.clone(),
            })
            .collect()
    }

    /// Region ids to highlight: each level's region, then the last level's
    /// expanded row if it has one
    pub fn path_ids(levels: &[AggregationLevel]) -> Vec<RegionId> {
        let mut path: Vec<RegionId> = levels.iter().map(|l| l.region.id).collect();
        if let Some(row) = levels.last().and_then(|l| l.expanded_row) {
            path.push(row);
        }
        path
    }

    /// A level was appended at `index`
    pub fn on_expand(&mut self, index: usize) {
        self.pending_focus = Some(index);
    }

    /// The stack was cut to `len` levels
    pub fn on_truncate(&mut self, len: usize) {
        if self.pending_focus.is_some_and(|i| i >= len) {
            self.pending_focus = None;
        }
    }

    /// The level waiting for focus, without consuming it
    pub fn pending_focus(&self) -> Option<usize> {
        self.pending_focus
    }

    /// Consume the focus request
    pub fn take_focus(&mut self) -> Option<usize> {
        self.pending_focus.take()
    }
}
