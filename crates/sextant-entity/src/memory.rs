//! In-memory entity store with failure injection, for tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use sextant_core::error::{Result, SextantError};
use sextant_core::types::Manifest;

use crate::store::EntityStore;

#[derive(Debug, Default)]
struct Inner {
    manifests: HashMap<String, Manifest>,
    components: HashMap<String, Value>,
    failing_manifests: HashSet<String>,
}

/// Entity store backed by hash maps.
///
/// Missing manifests and components report `NotFound`; ids registered with
/// [`InMemoryEntityStore::fail_manifest`] report a provider error instead.
/// Calls are counted so callers can assert on resolution traffic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    inner: Arc<RwLock<Inner>>,
    manifest_calls: Arc<AtomicUsize>,
    component_calls: Arc<AtomicUsize>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_manifest(&self, manifest: Manifest) {
        if let Ok(mut inner) = self.inner.write() {
            inner.manifests.insert(manifest.pi.clone(), manifest);
        }
    }

    pub fn insert_component(&self, cid: &str, doc: Value) {
        if let Ok(mut inner) = self.inner.write() {
            inner.components.insert(cid.to_string(), doc);
        }
    }

    pub fn fail_manifest(&self, pi: &str) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failing_manifests.insert(pi.to_string());
        }
    }

    /// Number of manifest fetches attempted so far.
    pub fn manifest_calls(&self) -> usize {
        self.manifest_calls.load(Ordering::SeqCst)
    }

    /// Number of component fetches attempted so far.
    pub fn component_calls(&self) -> usize {
        self.component_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get_manifest(&self, pi: &str) -> Result<Manifest> {
        self.manifest_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self
            .inner
            .read()
            .map_err(|e| SextantError::Provider(format!("Lock poisoned: {}", e)))?;
        if inner.failing_manifests.contains(pi) {
            return Err(SextantError::Provider(format!(
                "Failed to fetch manifest: 503 for {}",
                pi
            )));
        }
        inner
            .manifests
            .get(pi)
            .cloned()
            .ok_or_else(|| SextantError::NotFound(format!("Entity not found: {}", pi)))
    }

    async fn get_component(&self, cid: &str) -> Result<Value> {
        self.component_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self
            .inner
            .read()
            .map_err(|e| SextantError::Provider(format!("Lock poisoned: {}", e)))?;
        inner
            .components
            .get(cid)
            .cloned()
            .ok_or_else(|| SextantError::NotFound(format!("Component not found: {}", cid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_manifest_not_found() {
        let store = InMemoryEntityStore::new();
        let err = store.get_manifest("nope").await.unwrap_err();
        assert!(matches!(err, SextantError::NotFound(_)));
        assert_eq!(store.manifest_calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_manifest_is_provider_error() {
        let store = InMemoryEntityStore::new();
        store.insert_manifest(Manifest::new("01A"));
        store.fail_manifest("01A");
        let err = store.get_manifest("01A").await.unwrap_err();
        assert!(matches!(err, SextantError::Provider(_)));
    }

    #[tokio::test]
    async fn test_get_component() {
        let store = InMemoryEntityStore::new();
        store.insert_component("bafy1", json!("plain text"));
        assert_eq!(store.get_component("bafy1").await.unwrap(), json!("plain text"));
        assert!(store.get_component("bafy2").await.is_err());
        assert_eq!(store.component_calls(), 2);
    }
}
