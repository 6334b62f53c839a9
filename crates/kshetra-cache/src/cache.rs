//! Region lookup cache with in-flight coalescing
//!
//! The [`RegionCache`] memoizes child lists per parent region. Entries are
//! never evicted; they live as long as the cache. Provider failures are
//! logged and surface as an empty list, and are not memoized, so asking
//! again retries the provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use kshetra_core::{ParentKey, ProviderError, RegionId, RegionNode, RegionProvider, RegionType};
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

type Children = Arc<Vec<RegionNode>>;
type Flight = Arc<OnceCell<Result<Children, ProviderError>>>;

/// Counters describing how lookups were served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from a memoized entry
    pub hits: u64,
    /// Started a provider call
    pub misses: u64,
    /// Joined a provider call already in flight
    pub coalesced: u64,
    /// Provider calls issued
    pub provider_calls: u64,
    /// Provider calls that failed
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    provider_calls: AtomicU64,
    failures: AtomicU64,
}

/// Memoizing, coalescing client over a region provider
///
/// Shared by every selector on a page through an `Arc`.
pub struct RegionCache<P> {
    provider: P,
    /// Child lists by parent key
    entries: DashMap<ParentKey, Children>,
    /// Lookups currently waiting on the provider; a fetch memoizes its
    /// result only while its own flight is still registered here
    inflight: DashMap<ParentKey, Flight>,
    counters: Counters,
}

impl<P: RegionProvider> RegionCache<P> {
    /// Create an empty cache over `provider`
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            entries: DashMap::new(),
            inflight: DashMap::new(),
            counters: Counters::default(),
        }
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Children of `parent`, optionally restricted to one type
    pub async fn get_children(&self, parent: RegionId, kind: Option<RegionType>) -> Vec<RegionNode> {
        let all = self.load(Some(parent)).await;
        match kind {
            None => all.as_ref().clone(),
            Some(kind) => all.iter().filter(|n| n.kind == kind).cloned().collect(),
        }
    }

    /// Children of `parent` whose type is one of `kinds`, in provider order
    pub async fn get_children_of(&self, parent: RegionId, kinds: &[RegionType]) -> Vec<RegionNode> {
        let all = self.load(Some(parent)).await;
        all.iter()
            .filter(|n| kinds.contains(&n.kind))
            .cloned()
            .collect()
    }

    /// Top-level regions
    pub async fn roots(&self) -> Vec<RegionNode> {
        self.load(None).await.as_ref().clone()
    }

    /// The memoized child list for `key`, without calling the provider
    pub fn cached(&self, key: ParentKey) -> Option<Vec<RegionNode>> {
        self.entries.get(&key).map(|e| e.value().as_ref().clone())
    }

    /// Drop the entry for `key` so the next lookup refetches
    ///
    /// A lookup for `key` already in flight still answers its waiters but
    /// is not memoized. Other parents are untouched.
    pub fn invalidate(&self, key: ParentKey) {
        // Flight first: a fetch holding its flight's shard has either
        // memoized already, or will find its flight gone
        self.inflight.remove(&key);
        self.entries.remove(&key);
        debug!(parent = ?key, "region cache entry invalidated");
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inflight.clear();
        self.entries.clear();
        debug!("region cache cleared");
    }

    /// Number of memoized parents
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is memoized
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the lookup counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
            provider_calls: self.counters.provider_calls.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    async fn load(&self, key: ParentKey) -> Children {
        if let Some(hit) = self.entries.get(&key).map(|e| Arc::clone(e.value())) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            trace!(parent = ?key, "region cache hit");
            return hit;
        }

        let flight = match self.inflight.entry(key) {
            Entry::Occupied(e) => {
                self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                trace!(parent = ?key, "joining in-flight region lookup");
                Arc::clone(e.get())
            }
            Entry::Vacant(e) => {
                // The previous leader may have finished between the two lookups
                if let Some(hit) = self.entries.get(&key).map(|h| Arc::clone(h.value())) {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    return hit;
                }
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                let flight: Flight = Arc::new(OnceCell::new());
                e.insert(Arc::clone(&flight));
                flight
            }
        };

        match flight.get_or_init(|| self.fetch(key, &flight)).await {
            Ok(nodes) => Arc::clone(nodes),
            Err(_) => Arc::new(Vec::new()),
        }
    }

    async fn fetch(&self, key: ParentKey, flight: &Flight) -> Result<Children, ProviderError> {
        self.counters.provider_calls.fetch_add(1, Ordering::Relaxed);
        debug!(parent = ?key, "fetching regions from provider");

        let result = match key {
            None => self.provider.roots().await,
            Some(parent) => self.provider.children(parent, None).await,
        }
        .map(Arc::new);

        if let Err(error) = &result {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
            warn!(parent = ?key, error = %error, "region lookup failed, treating as empty");
        }

        match self.inflight.entry(key) {
            Entry::Occupied(current) if Arc::ptr_eq(current.get(), flight) => {
                if let Ok(nodes) = &result {
                    self.entries.insert(key, Arc::clone(nodes));
                    trace!(parent = ?key, count = nodes.len(), "regions memoized");
                }
                current.remove();
            }
            _ => trace!(parent = ?key, "lookup invalidated while in flight, not memoized"),
        }
        result
    }
}
