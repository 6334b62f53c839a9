//! # Kshetra Report
//!
//! Drill-down reports over the region hierarchy.
//!
//! A report starts at one root region and lists its children with their
//! counts. Expanding a row appends a level listing that row's children, so
//! the stack always reads as a single path from the root down.
//!
//! ## Core Components
//!
//! - [`DrillDownAggregator`]: The level stack, lazy fetching and rollups
//! - [`AggregationLevel`]: One level's region, rows and load state
//! - [`Rollup`]: Metric sums over a level's rows
//! - [`NavigationPathTracker`]: Breadcrumb, highlighted path and focus
//! - [`root_region`]: Where a report starts for a given user

pub mod aggregator;
pub mod level;
pub mod navigation;
pub mod root;

pub use aggregator::{DrillDownAggregator, ExpandOutcome, ReportSnapshot};
pub use level::{AggregationLevel, Rollup};
pub use navigation::{Crumb, NavigationPathTracker};
pub use root::{resolve_root, root_region};
