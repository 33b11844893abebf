//! Vector index trait, namespace fan-out, and an in-memory implementation.
//!
//! `VectorIndex::search_namespace` is the raw, fallible per-namespace call.
//! `query_namespace` and `query_namespaces` wrap it so that a failing
//! namespace degrades to an empty match set instead of failing the request.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use sextant_core::error::{Result, SextantError};
use sextant_core::types::{Match, NamespaceMatches};

/// A multi-namespace vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Resolve the connection handle. Idempotent: a second call is a no-op.
    async fn init(&self) -> Result<()>;

    /// Enumerate every namespace currently present in the index.
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// Query one namespace, propagating any failure.
    async fn search_namespace(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<Match>>;

    /// Query one namespace; a failure is logged and yields no matches.
    async fn query_namespace(&self, namespace: &str, vector: &[f32], top_k: usize) -> Vec<Match> {
        match self.search_namespace(namespace, vector, top_k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "Namespace query failed, contributing no matches");
                Vec::new()
            }
        }
    }

    /// Query every namespace concurrently and wait for all of them.
    ///
    /// Never fails as a whole and never cancels a sibling branch. One entry
    /// is returned per namespace, in input order.
    async fn query_namespaces(
        &self,
        namespaces: &[String],
        vector: &[f32],
        top_k: usize,
    ) -> Vec<NamespaceMatches> {
        let queries = namespaces.iter().map(|ns| async move {
            NamespaceMatches {
                namespace: ns.clone(),
                matches: self.query_namespace(ns, vector, top_k).await,
            }
        });
        join_all(queries).await
    }
}

// ---------------------------------------------------------------------------
// InMemoryIndex - brute-force cosine similarity per namespace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct VectorEntry {
    id: String,
    embedding: Vec<f32>,
    metadata: Value,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Thread-safe via interior RwLock. Namespaces can be marked as failing and
/// listing can be forced to fail, which lets callers exercise the
/// partial-failure paths without a network.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    namespaces: Arc<RwLock<BTreeMap<String, Vec<VectorEntry>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    fail_listing: Arc<RwLock<Option<String>>>,
    init_calls: Arc<AtomicUsize>,
    query_calls: Arc<AtomicUsize>,
}

impl InMemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vector into `namespace`, creating the namespace if needed.
    ///
    /// Overwrites any existing entry with the same id in that namespace.
    pub fn insert(
        &self,
        namespace: &str,
        id: &str,
        embedding: Vec<f32>,
        metadata: Value,
    ) -> Result<()> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|e| SextantError::Provider(format!("Lock poisoned: {}", e)))?;
        let entries = namespaces.entry(namespace.to_string()).or_default();
        entries.retain(|entry| entry.id != id);
        entries.push(VectorEntry {
            id: id.to_string(),
            embedding,
            metadata,
        });
        Ok(())
    }

    /// Make every query against `namespace` fail with a provider error.
    pub fn fail_namespace(&self, namespace: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(namespace.to_string());
        }
    }

    /// Make `list_namespaces` fail with a provider error.
    pub fn fail_listing(&self, reason: &str) {
        if let Ok(mut fail) = self.fail_listing.write() {
            *fail = Some(reason.to_string());
        }
    }

    /// Number of `init` calls made so far.
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Number of namespace queries attempted so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Total number of vectors across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces
            .read()
            .map(|ns| ns.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Return true if the index contains no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn init(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let fail = self
            .fail_listing
            .read()
            .map_err(|e| SextantError::Provider(format!("Lock poisoned: {}", e)))?
            .clone();
        if let Some(reason) = fail {
            return Err(SextantError::Provider(format!(
                "Failed to list namespaces: {}",
                reason
            )));
        }
        let namespaces = self
            .namespaces
            .read()
            .map_err(|e| SextantError::Provider(format!("Lock poisoned: {}", e)))?;
        Ok(namespaces.keys().cloned().collect())
    }

    async fn search_namespace(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<Match>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);

        let is_failing = self
            .failing
            .read()
            .map(|f| f.contains(namespace))
            .unwrap_or(false);
        if is_failing {
            return Err(SextantError::Provider(format!(
                "Failed to query namespace {}: upstream unavailable",
                namespace
            )));
        }

        let namespaces = self
            .namespaces
            .read()
            .map_err(|e| SextantError::Provider(format!("Lock poisoned: {}", e)))?;

        let Some(entries) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<Match> = entries
            .iter()
            .map(|entry| Match {
                id: entry.id.clone(),
                score: cosine_similarity(vector, &entry.embedding) as f32,
                namespace: namespace.to_string(),
                metadata: entry.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        debug!(namespace = %namespace, hits = scored.len(), "In-memory namespace query");
        Ok(scored)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
