//! # Kshetra Select
//!
//! Resolves one concrete region for a new record.
//!
//! The user walks the hierarchy from the top (or from below their assigned
//! region) one level at a time. Each pick clears everything below it and
//! loads the next level's options, so the selection is always a single
//! contiguous path with at most one branch active below JILA.
//!
//! ## Core Components
//!
//! - [`AccessScopePolicy`]: Computes what a user may pick from their
//!   assignment and grant
//! - [`AccessScope`]: Fixed prefix, depth cap and offered branches
//! - [`CascadingSelectionController`]: Applies picks, loads options, drops
//!   stale responses
//! - [`SelectionState`]: One optional region per level
//! - [`check_submission`]: Whether the selection can be submitted
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kshetra_cache::RegionCache;
//! use kshetra_select::{AccessScopePolicy, CascadingSelectionController};
//!
//! let scope = AccessScopePolicy::new(&config).resolve_for(&auth, &provider).await;
//! let selector = CascadingSelectionController::new(Arc::new(RegionCache::new(provider)), scope);
//! selector.mount().await;
//! selector.select_id(RegionType::Vibhag, vibhag_id).await?;
//! let region = selector.submission()?;
//! ```

pub mod controller;
pub mod scope;
pub mod state;
pub mod submission;

pub use controller::{CascadingSelectionController, SelectOutcome, SlotPhase};
pub use scope::{AccessScope, AccessScopePolicy};
pub use state::SelectionState;
pub use submission::{SubmissionBlock, check_submission};
