//! Access scopes
//!
//! An [`AccessScope`] says which hierarchy levels a user may pick. Levels at
//! and above the user's assigned region are fixed; levels deeper than the
//! grant's cap are out of reach.

use kshetra_core::{
    AccessGrant, AccessLevel, AuthContext, Branch, EngineConfig, RegionNode, RegionProvider,
    RegionType, Role, SelectionError,
};
use tracing::{debug, warn};

/// What a user may select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessScope {
    /// The assigned region and its ancestors, root first; read-only
    pub fixed_prefix: Vec<RegionNode>,
    /// Deepest selectable level; `None` or a terminal level means no cap
    pub max_selectable_type: Option<RegionType>,
    /// Submission needs a BASTI or GRAM
    pub require_terminal: bool,
    /// Branch heads offered below JILA
    pub offered_branches: Vec<Branch>,
    /// Pick the only offered child automatically
    pub auto_select_single_child: bool,
}

impl Default for AccessScope {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl AccessScope {
    /// Every level selectable, both branches offered
    pub fn unrestricted() -> Self {
        Self {
            fixed_prefix: Vec::new(),
            max_selectable_type: None,
            require_terminal: false,
            offered_branches: Branch::ALL.to_vec(),
            auto_select_single_child: false,
        }
    }

    /// Cap selection at `max`
    pub fn with_cap(mut self, max: RegionType) -> Self {
        self.max_selectable_type = Some(max);
        self
    }

    /// Fix the given chain, root first
    pub fn with_fixed_prefix(mut self, prefix: Vec<RegionNode>) -> Self {
        self.fixed_prefix = prefix;
        self
    }

    /// Require a terminal region before submission
    pub fn requiring_terminal(mut self) -> Self {
        self.require_terminal = true;
        self
    }

    /// Offer only the given branches below JILA
    pub fn with_branches(mut self, branches: &[Branch]) -> Self {
        self.offered_branches = branches.to_vec();
        self
    }

    /// Enable single-child auto-selection
    pub fn with_auto_select(mut self, enabled: bool) -> Self {
        self.auto_select_single_child = enabled;
        self
    }

    /// The deepest fixed level, if any
    pub fn deepest_fixed(&self) -> Option<RegionType> {
        self.fixed_prefix.last().map(|n| n.kind)
    }

    /// The fixed region at `kind`, if that level is fixed
    pub fn fixed_region(&self, kind: RegionType) -> Option<&RegionNode> {
        self.fixed_prefix.iter().find(|n| n.kind == kind)
    }

    /// Whether `kind` is fixed by the assignment
    pub fn is_fixed(&self, kind: RegionType) -> bool {
        self.fixed_region(kind).is_some()
    }

    /// Whether `branch` is offered at JILA
    pub fn offers_branch(&self, branch: Branch) -> bool {
        self.offered_branches.contains(&branch)
    }

    fn within_cap(&self, kind: RegionType) -> bool {
        match self.max_selectable_type {
            None => true,
            Some(max) if max.is_terminal() => true,
            Some(max) => kind.depth() <= max.depth(),
        }
    }

    /// Check that the user may pick a region of `kind`
    pub fn check(&self, kind: RegionType) -> Result<(), SelectionError> {
        if self.is_fixed(kind) {
            return Err(SelectionError::FixedLevel(kind));
        }
        if let Some(deepest) = self.deepest_fixed() {
            if !deepest.is_ancestor_of(kind) {
                return Err(SelectionError::OutsideAssignment(kind));
            }
        }
        if !self.within_cap(kind) {
            if let Some(max) = self.max_selectable_type {
                return Err(SelectionError::BeyondScope { kind, max });
            }
        }
        if let Some(branch) = kind.branch() {
            if !self.offers_branch(branch) {
                return Err(SelectionError::BranchNotOffered { kind, branch });
            }
        }
        Ok(())
    }

    /// Whether the user may pick a region of `kind`
    pub fn permits(&self, kind: RegionType) -> bool {
        self.check(kind).is_ok()
    }

    /// Every selectable level, in hierarchy order
    pub fn selectable_types(&self) -> Vec<RegionType> {
        RegionType::ALL
            .into_iter()
            .filter(|k| self.permits(*k))
            .collect()
    }
}

/// Computes access scopes from assignments and grants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessScopePolicy {
    auto_select_single_child: bool,
    gate_branches_on_role: bool,
}

impl AccessScopePolicy {
    /// Create a policy from engine config
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            auto_select_single_child: config.auto_select_single_child,
            gate_branches_on_role: config.gate_branches_on_role,
        }
    }

    /// Depth cap implied by a grant
    pub fn cap_for(grant: AccessGrant) -> Option<RegionType> {
        match grant {
            AccessGrant::Role(Role::Admin) => None,
            AccessGrant::Role(_) => Some(RegionType::Nagar),
            AccessGrant::Level(AccessLevel::ViewOnly) => Some(RegionType::Nagar),
            AccessGrant::Level(AccessLevel::ToliCreation) => None,
        }
    }

    /// Compute the scope for an assigned chain (root first) and a grant
    ///
    /// A chain that does not start at PRANT, or skips a level, is cut at the
    /// first break.
    pub fn resolve(&self, chain: &[RegionNode], grant: AccessGrant) -> AccessScope {
        let fixed_prefix = valid_prefix(chain);
        if fixed_prefix.len() < chain.len() {
            warn!(
                chain_len = chain.len(),
                kept = fixed_prefix.len(),
                "assigned region chain is broken, truncating"
            );
        }

        let fixed_branch = fixed_prefix.iter().find_map(|n| n.kind.branch());
        let offered_branches = match fixed_branch {
            Some(branch) => vec![branch],
            None if self.gate_branches_on_role && is_role_limited(grant) => vec![Branch::Urban],
            None => Branch::ALL.to_vec(),
        };

        let scope = AccessScope {
            fixed_prefix,
            max_selectable_type: Self::cap_for(grant),
            require_terminal: grant == AccessGrant::Level(AccessLevel::ToliCreation),
            offered_branches,
            auto_select_single_child: self.auto_select_single_child,
        };
        debug!(
            grant = %grant,
            fixed = ?scope.deepest_fixed(),
            max = ?scope.max_selectable_type,
            "access scope resolved"
        );
        scope
    }

    /// Compute the scope for the signed-in user
    ///
    /// The assigned region's ancestry comes from `provider`; if that lookup
    /// fails the user is treated as unassigned.
    pub async fn resolve_for<P: RegionProvider + ?Sized>(
        &self,
        auth: &dyn AuthContext,
        provider: &P,
    ) -> AccessScope {
        let chain = match auth.assigned_region() {
            None => Vec::new(),
            Some(region) => match provider.ancestry(region).await {
                Ok(chain) => chain,
                Err(error) => {
                    warn!(region_id = %region, error = %error, "ancestry lookup failed, treating user as unassigned");
                    Vec::new()
                }
            },
        };
        self.resolve(&chain, auth.grant())
    }
}

fn is_role_limited(grant: AccessGrant) -> bool {
    matches!(grant, AccessGrant::Role(role) if role != Role::Admin)
}

fn valid_prefix(chain: &[RegionNode]) -> Vec<RegionNode> {
    let mut prefix: Vec<RegionNode> = Vec::with_capacity(chain.len());
    for node in chain {
        let fits = match prefix.last() {
            None => node.kind.parent().is_none(),
            Some(parent) => {
                node.kind.parent() == Some(parent.kind)
                    && node.parent_id.is_none_or(|id| id == parent.id)
            }
        };
        if !fits {
            break;
        }
        prefix.push(node.clone());
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use kshetra_core::{InMemoryRegionProvider, RegionId, StaticAuth};

    fn chain_to_jila() -> Vec<RegionNode> {
        vec![
            RegionNode::new(1u64, "Haryana", RegionType::Prant, None),
            RegionNode::new(2u64, "Rohtak", RegionType::Vibhag, Some(RegionId(1))),
            RegionNode::new(3u64, "Jhajjar", RegionType::Jila, Some(RegionId(2))),
        ]
    }

    #[test]
    fn test_unrestricted_permits_everything() {
        let scope = AccessScope::unrestricted();
        assert_eq!(scope.selectable_types(), RegionType::ALL.to_vec());
    }

    #[test]
    fn test_assignment_fixes_prefix() {
        let policy = AccessScopePolicy::default();
        let scope = policy.resolve(&chain_to_jila(), AccessGrant::Role(Role::Admin));

        assert_eq!(scope.deepest_fixed(), Some(RegionType::Jila));
        assert_eq!(
            scope.check(RegionType::Vibhag),
            Err(SelectionError::FixedLevel(RegionType::Vibhag))
        );
        assert_eq!(
            scope.selectable_types(),
            vec![
                RegionType::Nagar,
                RegionType::Basti,
                RegionType::Khand,
                RegionType::Mandal,
                RegionType::Gram
            ]
        );
    }

    #[test]
    fn test_role_cap_stops_at_depth_three() {
        let policy = AccessScopePolicy::default();
        let scope = policy.resolve(&[], AccessGrant::Role(Role::JilaKaryakarta));

        assert!(scope.permits(RegionType::Nagar));
        assert!(scope.permits(RegionType::Khand));
        assert_eq!(
            scope.check(RegionType::Basti),
            Err(SelectionError::BeyondScope {
                kind: RegionType::Basti,
                max: RegionType::Nagar
            })
        );
        assert!(!scope.permits(RegionType::Mandal));
        assert!(!scope.require_terminal);
    }

    #[test]
    fn test_access_levels() {
        let policy = AccessScopePolicy::default();

        let view = policy.resolve(&chain_to_jila(), AccessLevel::ViewOnly.into());
        assert_eq!(view.max_selectable_type, Some(RegionType::Nagar));
        assert!(!view.require_terminal);

        let create = policy.resolve(&chain_to_jila(), AccessLevel::ToliCreation.into());
        assert_eq!(create.max_selectable_type, None);
        assert!(create.require_terminal);
        assert!(create.permits(RegionType::Gram));
    }

    #[test]
    fn test_terminal_cap_means_full_depth() {
        let scope = AccessScope::unrestricted().with_cap(RegionType::Basti);
        assert!(scope.permits(RegionType::Gram));
    }

    #[test]
    fn test_assignment_below_jila_excludes_other_branch() {
        let mut chain = chain_to_jila();
        chain.push(RegionNode::new(4u64, "Bahadurgarh", RegionType::Nagar, Some(RegionId(3))));

        let scope = AccessScopePolicy::default().resolve(&chain, AccessLevel::ToliCreation.into());
        assert_eq!(scope.offered_branches, vec![Branch::Urban]);
        assert!(scope.permits(RegionType::Basti));
        assert_eq!(
            scope.check(RegionType::Khand),
            Err(SelectionError::OutsideAssignment(RegionType::Khand))
        );
    }

    #[test]
    fn test_branch_gate_applies_to_roles_only() {
        let policy = AccessScopePolicy::new(&EngineConfig::urban_only_roles());

        let role = policy.resolve(&chain_to_jila(), Role::VibhagKaryakarta.into());
        assert_eq!(role.offered_branches, vec![Branch::Urban]);
        assert_eq!(
            role.check(RegionType::Khand),
            Err(SelectionError::BranchNotOffered {
                kind: RegionType::Khand,
                branch: Branch::Rural
            })
        );

        let admin = policy.resolve(&chain_to_jila(), Role::Admin.into());
        assert_eq!(admin.offered_branches, Branch::ALL.to_vec());

        let level = policy.resolve(&chain_to_jila(), AccessLevel::ViewOnly.into());
        assert_eq!(level.offered_branches, Branch::ALL.to_vec());
    }

    #[test]
    fn test_broken_chain_is_truncated() {
        let mut chain = chain_to_jila();
        // Jila pointing at the wrong Vibhag
        chain[2].parent_id = Some(RegionId(9));
        let scope = AccessScopePolicy::default().resolve(&chain, Role::Admin.into());
        assert_eq!(scope.deepest_fixed(), Some(RegionType::Vibhag));

        let headless = &chain_to_jila()[1..];
        let scope = AccessScopePolicy::default().resolve(headless, Role::Admin.into());
        assert!(scope.fixed_prefix.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_for_user() {
        let provider = InMemoryRegionProvider::new();
        for node in chain_to_jila() {
            provider.insert(node);
        }
        let policy = AccessScopePolicy::new(&EngineConfig::guided());

        let auth = StaticAuth::new(Some(RegionId(2)), Role::VibhagKaryakarta);
        let scope = policy.resolve_for(&auth, &provider).await;
        assert_eq!(scope.deepest_fixed(), Some(RegionType::Vibhag));
        assert!(scope.auto_select_single_child);

        let lost = StaticAuth::new(Some(RegionId(77)), Role::VibhagKaryakarta);
        let scope = policy.resolve_for(&lost, &provider).await;
        assert!(scope.fixed_prefix.is_empty());
        assert!(scope.permits(RegionType::Prant));
    }
}
