//! Region identifiers, hierarchy levels and region nodes

use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::hierarchy::{self, LevelDescriptor};

/// Unique identifier of a region
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl RegionId {
    /// Create a new region id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric id
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RegionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Key used for child lookups: `None` addresses the top-level regions
pub type ParentKey = Option<RegionId>;

/// One of the two mutually exclusive paths below JILA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Branch {
    /// NAGAR → BASTI
    Urban,
    /// KHAND → MANDAL → GRAM
    Rural,
}

impl Branch {
    /// Both branches, urban first
    pub const ALL: [Branch; 2] = [Branch::Urban, Branch::Rural];

    /// The first level of this branch
    pub const fn head(self) -> RegionType {
        match self {
            Branch::Urban => RegionType::Nagar,
            Branch::Rural => RegionType::Khand,
        }
    }

    /// The opposite branch
    pub const fn other(self) -> Branch {
        match self {
            Branch::Urban => Branch::Rural,
            Branch::Rural => Branch::Urban,
        }
    }

    /// Every level that belongs to this branch, head first
    pub fn members(self) -> Vec<RegionType> {
        let head = self.head();
        let mut members = vec![head];
        members.extend(head.descendants());
        members
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Urban => write!(f, "urban"),
            Branch::Rural => write!(f, "rural"),
        }
    }
}

/// Hierarchy level of a region
///
/// Variants are declared in hierarchy order, so the derived `Ord` walks the
/// urban branch before the rural one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegionType {
    Prant,
    Vibhag,
    Jila,
    Nagar,
    Basti,
    Khand,
    Mandal,
    Gram,
}

impl RegionType {
    /// Number of hierarchy levels
    pub const COUNT: usize = 8;

    /// All levels in hierarchy order
    pub const ALL: [RegionType; Self::COUNT] = [
        RegionType::Prant,
        RegionType::Vibhag,
        RegionType::Jila,
        RegionType::Nagar,
        RegionType::Basti,
        RegionType::Khand,
        RegionType::Mandal,
        RegionType::Gram,
    ];

    /// Position in [`RegionType::ALL`], usable as an array index
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The descriptor row for this level
    pub fn descriptor(self) -> &'static LevelDescriptor {
        hierarchy::descriptor(self)
    }

    /// The level directly above, `None` for PRANT
    pub fn parent(self) -> Option<RegionType> {
        self.descriptor().parent
    }

    /// Levels directly below (two for JILA)
    pub fn children(self) -> &'static [RegionType] {
        self.descriptor().children
    }

    /// Terminal levels cannot be expanded or selected past
    pub fn is_terminal(self) -> bool {
        self.descriptor().terminal
    }

    /// The branch this level belongs to, if it sits below JILA
    pub fn branch(self) -> Option<Branch> {
        self.descriptor().branch
    }

    /// Distance from PRANT; NAGAR and KHAND share depth 3
    pub fn depth(self) -> u8 {
        self.descriptor().depth
    }

    /// Whether this level starts a branch
    pub fn is_branch_head(self) -> bool {
        matches!(self, RegionType::Nagar | RegionType::Khand)
    }

    /// Levels above this one, nearest first
    pub fn ancestors(self) -> Vec<RegionType> {
        hierarchy::ancestors(self)
    }

    /// Every level reachable below this one, in hierarchy order
    pub fn descendants(self) -> Vec<RegionType> {
        hierarchy::descendants(self)
    }

    /// Whether `self` sits strictly above `other` on its path
    pub fn is_ancestor_of(self, other: RegionType) -> bool {
        other.ancestors().contains(&self)
    }

    /// Levels cleared when a region of this level is (re)selected
    pub fn reset_set(self) -> Vec<RegionType> {
        hierarchy::reset_set(self)
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionType::Prant => "Prant",
            RegionType::Vibhag => "Vibhag",
            RegionType::Jila => "Jila",
            RegionType::Nagar => "Nagar",
            RegionType::Basti => "Basti",
            RegionType::Khand => "Khand",
            RegionType::Mandal => "Mandal",
            RegionType::Gram => "Gram",
        };
        f.write_str(name)
    }
}

/// A concrete region in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionNode {
    pub id: RegionId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type")]
    pub kind: RegionType,
    #[serde(default)]
    pub parent_id: Option<RegionId>,
}

impl RegionNode {
    /// Create a new region node
    pub fn new(
        id: impl Into<RegionId>,
        name: impl Into<String>,
        kind: RegionType,
        parent_id: Option<RegionId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: String::new(),
            kind,
            parent_id,
        }
    }

    /// Set the region code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Whether this region sits at a terminal level
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

impl fmt::Display for RegionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}
