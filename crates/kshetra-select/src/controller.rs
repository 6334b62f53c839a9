//! Cascading region selection
//!
//! The [`CascadingSelectionController`] walks the hierarchy one level at a
//! time. Picking a region clears every level below it, loads the next
//! level's options through the shared [`RegionCache`], and republishes the
//! most specific region picked so far.
//!
//! ## Staleness
//!
//! Every child load carries the generation of the level that started it. A
//! level's generation moves whenever it is picked again or cleared by an
//! ancestor, so a slow response for an abandoned pick is dropped instead of
//! overwriting the newer options.

use std::sync::Arc;

use kshetra_cache::RegionCache;
use kshetra_core::{
    ParentKey, RegionId, RegionNode, RegionProvider, RegionType, SelectionError, root_level,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::scope::AccessScope;
use crate::state::SelectionState;
use crate::submission::{SubmissionBlock, check_submission};

/// Lifecycle of one level's slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotPhase {
    /// Nothing picked
    #[default]
    Unset,
    /// Picked; the next level's options are loading
    LoadingChildren,
    /// Picked; the next level's options are offered
    Populated,
    /// Picked; nothing below can be picked
    Terminal,
}

/// Result of a selection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The pick was applied and its options loaded
    Applied { resolved: Option<RegionId> },
    /// The region is not among the offered options
    Ignored,
    /// A newer pick replaced this one before its options arrived
    Superseded,
}

#[derive(Debug)]
struct PendingLoad {
    /// Level whose children are loading; `None` for the top level
    origin: Option<RegionType>,
    parent: ParentKey,
    generation: u64,
    child_types: Vec<RegionType>,
}

enum LoadStep {
    Stale,
    Continue(Option<PendingLoad>),
}

#[derive(Debug, Default)]
struct Inner {
    state: SelectionState,
    phases: [SlotPhase; RegionType::COUNT],
    /// Offered regions per level, `None` until loaded
    options: [Option<Vec<RegionNode>>; RegionType::COUNT],
    generations: [u64; RegionType::COUNT],
    root_generation: u64,
}

impl Inner {
    fn generation(&self, origin: Option<RegionType>) -> u64 {
        match origin {
            Some(kind) => self.generations[kind.index()],
            None => self.root_generation,
        }
    }

    fn advance(&mut self, origin: Option<RegionType>) -> u64 {
        let slot = match origin {
            Some(kind) => &mut self.generations[kind.index()],
            None => &mut self.root_generation,
        };
        *slot = slot.wrapping_add(1);
        *slot
    }

    fn offered(&self, kind: RegionType, id: RegionId) -> Option<RegionNode> {
        self.options[kind.index()]
            .as_ref()
            .and_then(|list| list.iter().find(|n| n.id == id).cloned())
    }
}

/// Resolves one concrete region by walking the hierarchy
pub struct CascadingSelectionController<P> {
    cache: Arc<RegionCache<P>>,
    scope: AccessScope,
    inner: Mutex<Inner>,
    resolved_tx: watch::Sender<Option<RegionId>>,
}

impl<P: RegionProvider> CascadingSelectionController<P> {
    /// Create a controller; call [`mount`](Self::mount) before selecting
    pub fn new(cache: Arc<RegionCache<P>>, scope: AccessScope) -> Self {
        let (resolved_tx, _) = watch::channel(None);
        Self {
            cache,
            scope,
            inner: Mutex::new(Inner::default()),
            resolved_tx,
        }
    }

    /// The scope this controller enforces
    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }

    /// The shared region cache
    pub fn cache(&self) -> &Arc<RegionCache<P>> {
        &self.cache
    }

    /// Seed the fixed prefix and load the first selectable level
    pub async fn mount(&self) -> SelectOutcome {
        let pending = {
            let mut inner = self.inner.lock();
            inner.state = SelectionState::new();
            inner.phases = Default::default();
            inner.options = Default::default();
            for kind in RegionType::ALL {
                inner.advance(Some(kind));
            }

            let pending = match self.scope.fixed_prefix.split_last() {
                None => {
                    let generation = inner.advance(None);
                    Some(PendingLoad {
                        origin: None,
                        parent: None,
                        generation,
                        child_types: vec![root_level()],
                    })
                }
                Some((deepest, above)) => {
                    for node in &self.scope.fixed_prefix {
                        inner.options[node.kind.index()] = Some(vec![node.clone()]);
                    }
                    for node in above {
                        inner.state.set(node.clone());
                        inner.phases[node.kind.index()] = SlotPhase::Populated;
                    }
                    self.apply(&mut inner, deepest.clone())
                }
            };
            debug!(fixed = ?self.scope.deepest_fixed(), "selector mounted");
            self.publish(&inner);
            pending
        };
        self.run(pending).await
    }

    /// Reset to the fixed prefix; same as mounting again
    pub async fn clear(&self) -> SelectOutcome {
        self.mount().await
    }

    /// Pick `node` at level `kind`
    ///
    /// Rejected picks leave the state untouched. A node that is not among
    /// the offered options is ignored.
    pub async fn select_at(
        &self,
        kind: RegionType,
        node: RegionNode,
    ) -> Result<SelectOutcome, SelectionError> {
        if node.kind != kind {
            return Err(SelectionError::KindMismatch {
                expected: kind,
                actual: node.kind,
            });
        }

        let pending = {
            let mut inner = self.inner.lock();
            self.check_selectable(&inner, kind)?;
            let Some(offered) = inner.offered(kind, node.id) else {
                debug!(kind = %kind, region_id = %node.id, "region not offered, ignoring");
                return Ok(SelectOutcome::Ignored);
            };
            let pending = self.apply(&mut inner, offered);
            self.publish(&inner);
            pending
        };
        Ok(self.run(pending).await)
    }

    /// Pick the offered region with `id` at level `kind`
    pub async fn select_id(
        &self,
        kind: RegionType,
        id: RegionId,
    ) -> Result<SelectOutcome, SelectionError> {
        let node = {
            let inner = self.inner.lock();
            self.check_selectable(&inner, kind)?;
            inner.offered(kind, id)
        };
        match node {
            Some(node) => self.select_at(kind, node).await,
            None => {
                debug!(kind = %kind, region_id = %id, "region not offered, ignoring");
                Ok(SelectOutcome::Ignored)
            }
        }
    }

    /// Regions offered at `kind`; empty while unloaded
    pub fn options(&self, kind: RegionType) -> Vec<RegionNode> {
        self.inner.lock().options[kind.index()]
            .clone()
            .unwrap_or_default()
    }

    /// Phase of the slot at `kind`
    pub fn phase(&self, kind: RegionType) -> SlotPhase {
        self.inner.lock().phases[kind.index()]
    }

    /// Snapshot of the current selection
    pub fn state(&self) -> SelectionState {
        self.inner.lock().state.clone()
    }

    /// The most specific region picked
    pub fn resolved(&self) -> Option<RegionNode> {
        self.inner.lock().state.resolved().cloned()
    }

    /// Id of the most specific region picked
    pub fn resolved_id(&self) -> Option<RegionId> {
        self.inner.lock().state.resolved_id()
    }

    /// Watch the resolved region id
    pub fn subscribe(&self) -> watch::Receiver<Option<RegionId>> {
        self.resolved_tx.subscribe()
    }

    /// The region to submit, or why submission is blocked
    pub fn submission(&self) -> Result<RegionId, SubmissionBlock> {
        check_submission(&self.scope, &self.inner.lock().state)
    }

    fn check_selectable(&self, inner: &Inner, kind: RegionType) -> Result<(), SelectionError> {
        if let Err(error) = self.scope.check(kind) {
            warn!(kind = %kind, error = %error, "selection rejected by access scope");
            return Err(error);
        }
        if let Some(missing) = kind.ancestors().into_iter().find(|a| !inner.state.is_set(*a)) {
            let error = SelectionError::AncestorUnset { kind, missing };
            warn!(kind = %kind, error = %error, "selection rejected");
            return Err(error);
        }
        Ok(())
    }

    fn apply(&self, inner: &mut Inner, node: RegionNode) -> Option<PendingLoad> {
        let kind = node.kind;
        let id = node.id;

        for reset in kind.reset_set() {
            inner.state.clear(reset);
            inner.phases[reset.index()] = SlotPhase::Unset;
            inner.advance(Some(reset));
            // Sibling branch heads stay offered; they hang off the same parent
            if reset.parent() != kind.parent() {
                inner.options[reset.index()] = None;
            }
        }

        inner.state.set(node);
        let generation = inner.advance(Some(kind));
        debug!(kind = %kind, region_id = %id, generation, "region selected");

        let child_types: Vec<RegionType> = kind
            .children()
            .iter()
            .copied()
            .filter(|c| self.scope.permits(*c))
            .collect();
        if child_types.is_empty() {
            inner.phases[kind.index()] = SlotPhase::Terminal;
            return None;
        }

        inner.phases[kind.index()] = SlotPhase::LoadingChildren;
        for child in &child_types {
            inner.options[child.index()] = None;
        }
        Some(PendingLoad {
            origin: Some(kind),
            parent: Some(id),
            generation,
            child_types,
        })
    }

    async fn run(&self, mut pending: Option<PendingLoad>) -> SelectOutcome {
        while let Some(load) = pending {
            match self.load_children(load).await {
                LoadStep::Stale => return SelectOutcome::Superseded,
                LoadStep::Continue(next) => pending = next,
            }
        }
        SelectOutcome::Applied {
            resolved: self.resolved_id(),
        }
    }

    async fn load_children(&self, load: PendingLoad) -> LoadStep {
        let children = match load.parent {
            None => self.cache.roots().await,
            Some(parent) => self.cache.get_children_of(parent, &load.child_types).await,
        };

        let mut inner = self.inner.lock();
        if inner.generation(load.origin) != load.generation {
            trace!(
                origin = ?load.origin,
                generation = load.generation,
                "dropping stale child list"
            );
            return LoadStep::Stale;
        }

        for kind in &load.child_types {
            let offered: Vec<RegionNode> = children
                .iter()
                .filter(|n| n.kind == *kind)
                .cloned()
                .collect();
            inner.options[kind.index()] = Some(offered);
        }
        if let Some(origin) = load.origin {
            inner.phases[origin.index()] = if children.is_empty() {
                SlotPhase::Terminal
            } else {
                SlotPhase::Populated
            };
        }
        debug!(origin = ?load.origin, count = children.len(), "options loaded");

        let auto = match load.child_types.as_slice() {
            [only] if self.scope.auto_select_single_child => match inner.options[only.index()]
                .as_deref()
            {
                Some([single]) => Some(single.clone()),
                _ => None,
            },
            _ => None,
        };

        let next = auto.and_then(|node| {
            debug!(kind = %node.kind, region_id = %node.id, "auto-selecting single child");
            self.apply(&mut inner, node)
        });
        self.publish(&inner);
        LoadStep::Continue(next)
    }

    fn publish(&self, inner: &Inner) {
        let resolved = inner.state.resolved_id();
        self.resolved_tx.send_if_modified(|current| {
            if *current == resolved {
                false
            } else {
                *current = resolved;
                true
            }
        });
    }
}
