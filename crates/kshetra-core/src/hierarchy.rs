//! Declarative description of the region hierarchy
//!
//! Every walker in Kshetra reads the shape of the geography from
//! [`HIERARCHY`] instead of hard-coding per-level branches:
//!
//! ```text
//! PRANT → VIBHAG → JILA ─┬─ NAGAR → BASTI            (urban)
//!                        └─ KHAND → MANDAL → GRAM    (rural)
//! ```

use crate::region::{Branch, RegionType};

/// One row of the hierarchy table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDescriptor {
    /// The level this row describes
    pub kind: RegionType,
    /// The level directly above
    pub parent: Option<RegionType>,
    /// Levels directly below
    pub children: &'static [RegionType],
    /// Terminal levels have no children and are not expandable
    pub terminal: bool,
    /// Branch membership for levels below JILA
    pub branch: Option<Branch>,
    /// Distance from PRANT
    pub depth: u8,
}

/// The hierarchy table, indexed by [`RegionType::index`]
pub static HIERARCHY: [LevelDescriptor; RegionType::COUNT] = [
    LevelDescriptor {
        kind: RegionType::Prant,
        parent: None,
        children: &[RegionType::Vibhag],
        terminal: false,
        branch: None,
        depth: 0,
    },
    LevelDescriptor {
        kind: RegionType::Vibhag,
        parent: Some(RegionType::Prant),
        children: &[RegionType::Jila],
        terminal: false,
        branch: None,
        depth: 1,
    },
    LevelDescriptor {
        kind: RegionType::Jila,
        parent: Some(RegionType::Vibhag),
        children: &[RegionType::Nagar, RegionType::Khand],
        terminal: false,
        branch: None,
        depth: 2,
    },
    LevelDescriptor {
        kind: RegionType::Nagar,
        parent: Some(RegionType::Jila),
        children: &[RegionType::Basti],
        terminal: false,
        branch: Some(Branch::Urban),
        depth: 3,
    },
    LevelDescriptor {
        kind: RegionType::Basti,
        parent: Some(RegionType::Nagar),
        children: &[],
        terminal: true,
        branch: Some(Branch::Urban),
        depth: 4,
    },
    LevelDescriptor {
        kind: RegionType::Khand,
        parent: Some(RegionType::Jila),
        children: &[RegionType::Mandal],
        terminal: false,
        branch: Some(Branch::Rural),
        depth: 3,
    },
    LevelDescriptor {
        kind: RegionType::Mandal,
        parent: Some(RegionType::Khand),
        children: &[RegionType::Gram],
        terminal: false,
        branch: Some(Branch::Rural),
        depth: 4,
    },
    LevelDescriptor {
        kind: RegionType::Gram,
        parent: Some(RegionType::Mandal),
        children: &[],
        terminal: true,
        branch: Some(Branch::Rural),
        depth: 5,
    },
];

/// Order in which the most specific selected region is chosen
pub const RESOLUTION_ORDER: [RegionType; RegionType::COUNT] = [
    RegionType::Gram,
    RegionType::Basti,
    RegionType::Mandal,
    RegionType::Khand,
    RegionType::Nagar,
    RegionType::Jila,
    RegionType::Vibhag,
    RegionType::Prant,
];

/// Look up the descriptor row for a level
pub fn descriptor(kind: RegionType) -> &'static LevelDescriptor {
    &HIERARCHY[kind.index()]
}

/// Levels above `kind`, nearest first
pub fn ancestors(kind: RegionType) -> Vec<RegionType> {
    let mut out = Vec::new();
    let mut current = descriptor(kind).parent;
    while let Some(parent) = current {
        out.push(parent);
        current = descriptor(parent).parent;
    }
    out
}

/// Every level reachable below `kind`, in hierarchy order
pub fn descendants(kind: RegionType) -> Vec<RegionType> {
    let mut out = Vec::new();
    let mut frontier: Vec<RegionType> = descriptor(kind).children.to_vec();
    while let Some(next) = frontier.pop() {
        if !out.contains(&next) {
            out.push(next);
            frontier.extend_from_slice(descriptor(next).children);
        }
    }
    out.sort();
    out
}

/// Levels cleared when a region of `kind` is selected
///
/// This is every descendant of `kind`; picking a branch head also clears the
/// whole opposite branch.
pub fn reset_set(kind: RegionType) -> Vec<RegionType> {
    let mut out = descendants(kind);
    if kind.is_branch_head() {
        if let Some(branch) = kind.branch() {
            out.extend(branch.other().members());
        }
    }
    out.sort();
    out.dedup();
    out
}

/// The first level of the hierarchy
pub fn root_level() -> RegionType {
    HIERARCHY[0].kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_kind() {
        for (i, row) in HIERARCHY.iter().enumerate() {
            assert_eq!(row.kind.index(), i);
            assert_eq!(row.terminal, row.children.is_empty());
            for child in row.children {
                assert_eq!(descriptor(*child).parent, Some(row.kind));
                assert_eq!(descriptor(*child).depth, row.depth + 1);
            }
        }
        assert_eq!(root_level(), RegionType::Prant);
    }

    #[test]
    fn test_ancestors() {
        assert!(ancestors(RegionType::Prant).is_empty());
        assert_eq!(
            ancestors(RegionType::Gram),
            vec![
                RegionType::Mandal,
                RegionType::Khand,
                RegionType::Jila,
                RegionType::Vibhag,
                RegionType::Prant
            ]
        );
        assert_eq!(
            ancestors(RegionType::Basti),
            vec![
                RegionType::Nagar,
                RegionType::Jila,
                RegionType::Vibhag,
                RegionType::Prant
            ]
        );
    }

    #[test]
    fn test_descendants() {
        assert_eq!(
            descendants(RegionType::Jila),
            vec![
                RegionType::Nagar,
                RegionType::Basti,
                RegionType::Khand,
                RegionType::Mandal,
                RegionType::Gram
            ]
        );
        assert_eq!(descendants(RegionType::Nagar), vec![RegionType::Basti]);
        assert!(descendants(RegionType::Gram).is_empty());
    }

    #[test]
    fn test_reset_set_for_vibhag() {
        let reset = reset_set(RegionType::Vibhag);
        assert_eq!(reset.len(), 6);
        assert!(!reset.contains(&RegionType::Prant));
        assert!(!reset.contains(&RegionType::Vibhag));
    }

    #[test]
    fn test_reset_set_for_branch_heads() {
        assert_eq!(
            reset_set(RegionType::Nagar),
            vec![
                RegionType::Basti,
                RegionType::Khand,
                RegionType::Mandal,
                RegionType::Gram
            ]
        );
        assert_eq!(
            reset_set(RegionType::Khand),
            vec![
                RegionType::Nagar,
                RegionType::Basti,
                RegionType::Mandal,
                RegionType::Gram
            ]
        );
        assert_eq!(reset_set(RegionType::Mandal), vec![RegionType::Gram]);
        assert!(reset_set(RegionType::Basti).is_empty());
    }

    #[test]
    fn test_is_ancestor_of() {
        assert!(RegionType::Jila.is_ancestor_of(RegionType::Gram));
        assert!(!RegionType::Nagar.is_ancestor_of(RegionType::Gram));
        assert!(!RegionType::Gram.is_ancestor_of(RegionType::Gram));
    }
}
