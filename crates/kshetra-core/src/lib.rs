//! # Kshetra Core
//!
//! Core types, traits, and errors for the Kshetra region engine.
//!
//! This crate describes the fixed administrative geography that every other
//! Kshetra crate walks, and the provider seams that let the same selection
//! and reporting logic run against a fixture (for tests and the CLI) or a
//! real backend.
//!
//! ## Key Types
//!
//! - [`RegionType`]: The eight hierarchy levels, in hierarchy order
//! - [`RegionNode`]: One concrete region
//! - [`SummaryItem`]: One row of per-region report metrics
//! - [`LevelDescriptor`]: Declarative row of the hierarchy table
//!
//! ## Key Traits
//!
//! - [`RegionProvider`]: Children and ancestry lookups
//! - [`SummaryProvider`]: Per-region report rows
//! - [`AuthContext`]: The signed-in user's assigned region and grant

pub mod auth;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod memory;
pub mod region;
pub mod summary;
pub mod traits;

// Re-export main types
pub use auth::*;
pub use config::*;
pub use error::*;
pub use hierarchy::*;
pub use memory::*;
pub use region::*;
pub use summary::*;
pub use traits::*;
