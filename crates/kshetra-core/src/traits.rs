//! Provider traits for Kshetra
//!
//! The engine never talks to a backend directly. Region and summary data
//! come through these traits so the same selection and reporting logic runs
//! against the in-memory fixture providers in tests and a real client in
//! production.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::region::{RegionId, RegionNode, RegionType};
use crate::summary::{ReportKind, SummaryItem};

/// Source of region data
#[async_trait]
pub trait RegionProvider: Send + Sync {
    /// Top-level regions (those without a parent)
    async fn roots(&self) -> Result<Vec<RegionNode>, ProviderError>;

    /// Children of `parent`
    ///
    /// With `kind == None` every child is returned; below JILA that means
    /// both NAGAR and KHAND children in one response.
    async fn children(
        &self,
        parent: RegionId,
        kind: Option<RegionType>,
    ) -> Result<Vec<RegionNode>, ProviderError>;

    /// The chain of regions from the root down to `region`, inclusive
    async fn ancestry(&self, region: RegionId) -> Result<Vec<RegionNode>, ProviderError>;
}

/// Source of per-region report rows
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Summary rows for the children of `region`
    async fn summary(
        &self,
        kind: ReportKind,
        region: RegionId,
    ) -> Result<Vec<SummaryItem>, ProviderError>;
}

#[async_trait]
impl<P: RegionProvider + ?Sized> RegionProvider for Arc<P> {
    async fn roots(&self) -> Result<Vec<RegionNode>, ProviderError> {
        (**self).roots().await
    }

    async fn children(
        &self,
        parent: RegionId,
        kind: Option<RegionType>,
    ) -> Result<Vec<RegionNode>, ProviderError> {
        (**self).children(parent, kind).await
    }

    async fn ancestry(&self, region: RegionId) -> Result<Vec<RegionNode>, ProviderError> {
        (**self).ancestry(region).await
    }
}

#[async_trait]
impl<S: SummaryProvider + ?Sized> SummaryProvider for Arc<S> {
    async fn summary(
        &self,
        kind: ReportKind,
        region: RegionId,
    ) -> Result<Vec<SummaryItem>, ProviderError> {
        (**self).summary(kind, region).await
    }
}
