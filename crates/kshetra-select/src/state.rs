//! Selection state: one optional region per hierarchy level

use kshetra_core::{Branch, RESOLUTION_ORDER, RegionId, RegionNode, RegionType};

/// The regions picked so far, one slot per level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    slots: [Option<RegionNode>; RegionType::COUNT],
    branch: Option<Branch>,
}

impl SelectionState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// The region picked at `kind`
    pub fn get(&self, kind: RegionType) -> Option<&RegionNode> {
        self.slots[kind.index()].as_ref()
    }

    /// Whether `kind` has a region
    pub fn is_set(&self, kind: RegionType) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// The active branch below JILA
    pub fn branch(&self) -> Option<Branch> {
        self.branch
    }

    /// The most specific region picked
    pub fn resolved(&self) -> Option<&RegionNode> {
        RESOLUTION_ORDER.iter().find_map(|kind| self.get(*kind))
    }

    /// Id of the most specific region picked
    pub fn resolved_id(&self) -> Option<RegionId> {
        self.resolved().map(|n| n.id)
    }

    /// Picked regions in hierarchy order
    pub fn path(&self) -> Vec<&RegionNode> {
        self.slots.iter().flatten().collect()
    }

    /// Whether nothing is picked
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Check the structural invariants
    ///
    /// Every picked slot has all its ancestors picked and points at the
    /// picked parent, the branch is only set under a picked JILA, and at
    /// most one branch has picked slots.
    pub fn is_consistent(&self) -> bool {
        for node in self.slots.iter().flatten() {
            if let Some(parent_kind) = node.kind.parent() {
                match self.get(parent_kind) {
                    Some(parent) if node.parent_id == Some(parent.id) => {}
                    _ => return false,
                }
            }
        }

        if self.branch.is_some() && !self.is_set(RegionType::Jila) {
            return false;
        }

        let active: Vec<Branch> = Branch::ALL
            .into_iter()
            .filter(|b| b.members().iter().any(|k| self.is_set(*k)))
            .collect();
        match active.as_slice() {
            [] => true,
            [only] => self.branch == Some(*only),
            _ => false,
        }
    }

    pub(crate) fn set(&mut self, node: RegionNode) {
        let kind = node.kind;
        if kind == RegionType::Jila {
            self.branch = None;
        }
        if kind.is_branch_head() {
            self.branch = kind.branch();
        }
        self.slots[kind.index()] = Some(node);
    }

    pub(crate) fn clear(&mut self, kind: RegionType) {
        self.slots[kind.index()] = None;
        if kind == RegionType::Jila {
            self.branch = None;
        }
        if kind.is_branch_head() && self.branch == kind.branch() {
            self.branch = None;
        }
    }
}
