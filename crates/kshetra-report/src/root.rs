//! Choosing the report root

use kshetra_core::{AuthContext, EngineConfig, RegionNode, RegionProvider, RegionType};
use tracing::warn;

/// The region a report starts from
///
/// This is the top of the user's assigned chain when it is a PRANT, and the
/// configured default root otherwise.
pub fn root_region(chain: &[RegionNode], config: &EngineConfig) -> RegionNode {
    match chain.first() {
        Some(top) if top.kind == RegionType::Prant => top.clone(),
        _ => config.default_root.to_node(),
    }
}

/// The report root for the signed-in user
pub async fn resolve_root<P: RegionProvider + ?Sized>(
    auth: &dyn AuthContext,
    provider: &P,
    config: &EngineConfig,
) -> RegionNode {
    let chain = match auth.assigned_region() {
        None => Vec::new(),
        Some(region) => provider.ancestry(region).await.unwrap_or_else(|error| {
            warn!(region_id = %region, error = %error, "ancestry lookup failed, using default root");
            Vec::new()
        }),
    };
    root_region(&chain, config)
}
