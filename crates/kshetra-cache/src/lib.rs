//! # Kshetra Cache
//!
//! Memoizing client over a [`RegionProvider`](kshetra_core::RegionProvider).
//!
//! Region lookups are keyed by parent region. One entry holds every child of
//! a parent regardless of type, so the NAGAR and KHAND options under a JILA
//! come from a single provider call. Concurrent lookups for the same parent
//! share one in-flight call.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kshetra_cache::RegionCache;
//!
//! let cache = Arc::new(RegionCache::new(provider));
//! let nagars = cache.get_children(jila_id, Some(RegionType::Nagar)).await;
//! ```

pub mod cache;

pub use cache::{CacheStats, RegionCache};
