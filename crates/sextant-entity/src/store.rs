use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use sextant_core::error::{Result, SextantError};
use sextant_core::types::{Manifest, ResolvedEntity};

/// Candidate metadata component names, in lookup order.
pub const METADATA_COMPONENTS: [&str; 5] = [
    "metadata",
    "catalog_record",
    "digital_object_metadata",
    "collection_metadata",
    "series_metadata",
];

/// First known metadata component present in `manifest`, as `(name, cid)`.
///
/// Entries whose value is not a string content address are skipped.
pub fn find_metadata_component(manifest: &Manifest) -> Option<(&'static str, &str)> {
    METADATA_COMPONENTS
        .iter()
        .find_map(|name| manifest.component(name).map(|cid| (*name, cid)))
}

/// A store of entities addressed by persistent identifier.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch the manifest for `pi`. Fails with `NotFound` if the store has no such id.
    async fn get_manifest(&self, pi: &str) -> Result<Manifest>;

    /// Fetch a content-addressed component. Structured documents decode to
    /// JSON; anything else comes back as a JSON string.
    async fn get_component(&self, cid: &str) -> Result<Value>;

    /// Resolve `pi` to its manifest and first known metadata document.
    ///
    /// A manifest failure makes the entity unresolvable. A metadata fetch
    /// failure only degrades the result to `metadata: None`.
    async fn resolve_entity(&self, pi: &str) -> Result<ResolvedEntity> {
        let manifest =
            self.get_manifest(pi)
                .await
                .map_err(|e| SextantError::EntityUnresolvable {
                    pi: pi.to_string(),
                    reason: e.to_string(),
                })?;

        let Some((name, cid)) = find_metadata_component(&manifest) else {
            debug!(pi = %pi, "Manifest names no metadata component");
            return Ok(ResolvedEntity {
                pi: pi.to_string(),
                manifest,
                metadata: None,
                metadata_cid: None,
            });
        };
        let cid = cid.to_string();

        let metadata = match self.get_component(&cid).await {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(pi = %pi, component = name, cid = %cid, error = %e, "Failed to fetch metadata component");
                None
            }
        };

        Ok(ResolvedEntity {
            pi: pi.to_string(),
            manifest,
            metadata,
            metadata_cid: Some(cid),
        })
    }

    /// Resolve every id concurrently. Unresolvable ids are logged and dropped.
    async fn resolve_entities(&self, pis: &[String]) -> Vec<ResolvedEntity> {
        let lookups = pis.iter().map(|pi| async move {
            match self.resolve_entity(pi).await {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!(pi = %pi, error = %e, "Dropping unresolvable entity");
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }
}
