//! In-memory providers for testing and fixtures
//!
//! Provides region and summary providers backed by plain collections, with
//! optional per-key latency and injected failures so tests can reproduce
//! slow or broken backends without a network.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kshetra_core::{InMemoryRegionProvider, RegionFixture, RegionProvider};
//!
//! let fixture = RegionFixture::load("fixtures/demo.json")?;
//! let regions = InMemoryRegionProvider::from_fixture(&fixture);
//! let prants = regions.roots().await?;
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ConfigError, ProviderError};
use crate::region::{ParentKey, RegionId, RegionNode, RegionType};
use crate::summary::{ReportKind, SummaryItem};
use crate::traits::{RegionProvider, SummaryProvider};

/// Summary rows for one region and report kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub kind: ReportKind,
    pub region_id: RegionId,
    pub rows: Vec<SummaryItem>,
}

/// Serialized region tree plus report rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFixture {
    pub regions: Vec<RegionNode>,
    #[serde(default)]
    pub summaries: Vec<SummaryEntry>,
}

impl RegionFixture {
    /// Parse a fixture from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let fixture: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Read and parse a fixture file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check ids are unique and parent links agree with the hierarchy
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut by_id: HashMap<RegionId, &RegionNode> = HashMap::new();
        for node in &self.regions {
            if by_id.insert(node.id, node).is_some() {
                return Err(ConfigError::Fixture(format!("duplicate region id {}", node.id)));
            }
        }
        for node in &self.regions {
            match (node.parent_id, node.kind.parent()) {
                (None, None) => {}
                (Some(parent_id), Some(expected)) => {
                    let parent = by_id.get(&parent_id).ok_or_else(|| {
                        ConfigError::Fixture(format!(
                            "region {} has unknown parent {}",
                            node.id, parent_id
                        ))
                    })?;
                    if parent.kind != expected {
                        return Err(ConfigError::Fixture(format!(
                            "{} cannot sit under {}",
                            node, parent
                        )));
                    }
                }
                (None, Some(_)) => {
                    return Err(ConfigError::Fixture(format!("{} is missing a parent", node)));
                }
                (Some(_), None) => {
                    return Err(ConfigError::Fixture(format!("{} cannot have a parent", node)));
                }
            }
        }
        Ok(())
    }
}

/// Region provider over an in-memory tree
#[derive(Default)]
pub struct InMemoryRegionProvider {
    /// Regions by id
    regions: DashMap<RegionId, RegionNode>,
    /// Child lists in insertion order, keyed by parent
    children: DashMap<ParentKey, Vec<RegionNode>>,
    /// Artificial response delay per parent key
    latency: DashMap<ParentKey, Duration>,
    /// Injected failures per parent key
    failures: DashMap<ParentKey, ProviderError>,
    /// Child lookups served (including failed ones), per parent key
    calls: DashMap<ParentKey, usize>,
    total_calls: AtomicUsize,
}

impl InMemoryRegionProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding every region of a fixture
    pub fn from_fixture(fixture: &RegionFixture) -> Self {
        let provider = Self::new();
        for node in &fixture.regions {
            provider.insert(node.clone());
        }
        provider
    }

    /// Add a region
    pub fn insert(&self, node: RegionNode) {
        self.children
            .entry(node.parent_id)
            .or_default()
            .push(node.clone());
        self.regions.insert(node.id, node);
    }

    /// Delay every child lookup under `parent`
    pub fn set_latency(&self, parent: ParentKey, delay: Duration) {
        self.latency.insert(parent, delay);
    }

    /// Make child lookups under `parent` fail until cleared
    pub fn fail_on(&self, parent: ParentKey, error: ProviderError) {
        self.failures.insert(parent, error);
    }

    /// Stop failing lookups under `parent`
    pub fn clear_failure(&self, parent: ParentKey) {
        self.failures.remove(&parent);
    }

    /// Number of child lookups served for `parent`
    pub fn calls_for(&self, parent: ParentKey) -> usize {
        self.calls.get(&parent).map(|c| *c).unwrap_or(0)
    }

    /// Total number of child lookups served
    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Look up a region by id without counting a call
    pub fn get(&self, id: RegionId) -> Option<RegionNode> {
        self.regions.get(&id).map(|node| node.clone())
    }

    async fn lookup(&self, parent: ParentKey) -> Result<Vec<RegionNode>, ProviderError> {
        *self.calls.entry(parent).or_insert(0) += 1;
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.latency.get(&parent).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.get(&parent).map(|e| e.clone());
        if let Some(error) = failure {
            return Err(error);
        }

        trace!(parent = ?parent, "serving children from memory");
        Ok(self
            .children
            .get(&parent)
            .map(|list| list.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RegionProvider for InMemoryRegionProvider {
    async fn roots(&self) -> Result<Vec<RegionNode>, ProviderError> {
        self.lookup(None).await
    }

    async fn children(
        &self,
        parent: RegionId,
        kind: Option<RegionType>,
    ) -> Result<Vec<RegionNode>, ProviderError> {
        let mut nodes = self.lookup(Some(parent)).await?;
        if let Some(kind) = kind {
            nodes.retain(|n| n.kind == kind);
        }
        Ok(nodes)
    }

    async fn ancestry(&self, region: RegionId) -> Result<Vec<RegionNode>, ProviderError> {
        let mut chain = Vec::new();
        let mut current = Some(region);
        while let Some(id) = current {
            let node = self.get(id).ok_or(ProviderError::RegionNotFound(id))?;
            current = node.parent_id;
            chain.push(node);
            if chain.len() > RegionType::COUNT {
                return Err(ProviderError::Malformed(format!(
                    "ancestry of {} does not terminate",
                    region
                )));
            }
        }
        chain.reverse();
        Ok(chain)
    }
}

/// Summary provider over in-memory rows
#[derive(Default)]
pub struct InMemorySummaryProvider {
    rows: DashMap<(ReportKind, RegionId), Vec<SummaryItem>>,
    latency: DashMap<RegionId, Duration>,
    failures: DashMap<RegionId, ProviderError>,
    total_calls: AtomicUsize,
}

impl InMemorySummaryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding every summary of a fixture
    pub fn from_fixture(fixture: &RegionFixture) -> Self {
        let provider = Self::new();
        for entry in &fixture.summaries {
            provider.set_rows(entry.kind, entry.region_id, entry.rows.clone());
        }
        provider
    }

    /// Set the rows reported for `region`
    pub fn set_rows(&self, kind: ReportKind, region: RegionId, rows: Vec<SummaryItem>) {
        self.rows.insert((kind, region), rows);
    }

    /// Delay every summary lookup for `region`
    pub fn set_latency(&self, region: RegionId, delay: Duration) {
        self.latency.insert(region, delay);
    }

    /// Make summary lookups for `region` fail
    pub fn fail_on(&self, region: RegionId, error: ProviderError) {
        self.failures.insert(region, error);
    }

    /// Total number of summary lookups served
    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryProvider for InMemorySummaryProvider {
    async fn summary(
        &self,
        kind: ReportKind,
        region: RegionId,
    ) -> Result<Vec<SummaryItem>, ProviderError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.latency.get(&region).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.get(&region).map(|e| e.clone());
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(self
            .rows
            .get(&(kind, region))
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }
}
