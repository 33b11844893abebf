//! The search pipeline.
//!
//! One `search` call runs:
//! 1. Normalize the query and clamp the result cap
//! 2. Resolve the index handle (idempotent)
//! 3. Embed the query
//! 4. Select namespaces (explicit list, or discovery)
//! 5. Query every namespace concurrently
//! 6. Merge-rank into a global top-K
//! 7. Resolve each distinct id concurrently
//! 8. Join entities onto matches and respond

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use sextant_core::config::SearchConfig;
use sextant_core::error::{Result, SextantError};
use sextant_core::types::{
    effective_top_k, SearchQuery, SearchResponse, DEFAULT_TOP_K, MAX_TOP_K,
};
use sextant_entity::EntityStore;
use sextant_vector::{EmbeddingProvider, VectorIndex};

use crate::rank::{join_entities, merge_rank, unique_ids};

/// Composes the embedding provider, vector index and entity store per query.
///
/// Holds no per-request state; one instance serves concurrent requests.
#[derive(Clone)]
pub struct SearchPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn EntityStore>,
    default_top_k: usize,
    max_top_k: usize,
}

impl SearchPipeline {
    /// Create a pipeline with the default result cap of 10 and ceiling of 100.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            default_top_k: DEFAULT_TOP_K,
            max_top_k: MAX_TOP_K,
        }
    }

    /// Override the result cap limits from configuration.
    ///
    /// The ceiling never exceeds [`MAX_TOP_K`], whatever the configuration says.
    pub fn with_limits(mut self, config: &SearchConfig) -> Self {
        self.max_top_k = config.max_top_k.clamp(1, MAX_TOP_K);
        self.default_top_k = config.default_top_k.clamp(1, self.max_top_k);
        self
    }

    /// Ceiling applied to requested result caps.
    pub fn max_top_k(&self) -> usize {
        self.max_top_k
    }

    /// Resolve the index handle and enumerate its namespaces.
    pub async fn list_namespaces(&self) -> Result<Vec<String>> {
        self.index.init().await?;
        self.index.list_namespaces().await
    }

    /// Run one search end to end.
    ///
    /// Fails only when the query is blank, the index handle cannot be
    /// resolved, embedding fails, or namespace discovery fails while no
    /// explicit namespaces were given. Per-namespace and per-entity failures
    /// shrink the result set instead.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResponse> {
        let started = Instant::now();

        if query.query.trim().is_empty() {
            return Err(SextantError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }
        let top_k = effective_top_k(query.top_k, self.default_top_k, self.max_top_k);

        self.index.init().await?;

        info!(
            query = %query.query,
            top_k,
            dimensions = self.embedder.dimensions(),
            "Generating embedding for query"
        );
        let vector = self.embedder.embed_query(&query.query).await?;

        let namespaces = match query.explicit_namespaces() {
            Some(explicit) => explicit.to_vec(),
            None => self.index.list_namespaces().await?,
        };

        let mut seen = HashSet::with_capacity(namespaces.len());
        let targets: Vec<String> = namespaces
            .iter()
            .filter(|ns| seen.insert(ns.as_str()))
            .cloned()
            .collect();
        debug!(namespaces = ?targets, "Querying namespaces");

        let per_namespace = self.index.query_namespaces(&targets, &vector, top_k).await;
        let ranked = merge_rank(per_namespace, top_k);
        info!(matches = ranked.len(), "Merge-ranked matches across namespaces");

        if ranked.is_empty() {
            return Ok(SearchResponse {
                query: query.query,
                namespaces,
                total_results: 0,
                results: Vec::new(),
                took_ms: elapsed_ms(started),
            });
        }

        let pis = unique_ids(&ranked);
        debug!(entities = pis.len(), "Resolving entities");
        let entities = self.store.resolve_entities(&pis).await;

        let results = join_entities(ranked, entities);
        let took_ms = elapsed_ms(started);
        info!(results = results.len(), took_ms, "Search complete");

        Ok(SearchResponse {
            query: query.query,
            namespaces,
            total_results: results.len(),
            results,
            took_ms,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
