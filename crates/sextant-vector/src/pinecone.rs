//! Pinecone-backed vector index adapter.
//!
//! The index host is looked up once through the control plane and cached in
//! a `OnceCell` for the adapter's lifetime. Concurrent first use from several
//! requests resolves it only once.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use sextant_core::config::IndexConfig;
use sextant_core::error::{Result, SextantError};
use sextant_core::types::Match;

use crate::http::{ensure_success, transport_error};
use crate::index::VectorIndex;

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexStatsResponse {
    #[serde(default)]
    namespaces: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Value,
}

/// Vector index adapter speaking the Pinecone REST API.
#[derive(Debug)]
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    index_name: String,
    control_plane_url: String,
    api_version: String,
    host: OnceCell<String>,
}

impl PineconeIndex {
    /// Build an adapter from configuration. `timeout` bounds every request.
    pub fn new(config: &IndexConfig, timeout: Duration) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SextantError::Config(
                "index API key cannot be empty".to_string(),
            ));
        }
        if config.index_name.trim().is_empty() {
            return Err(SextantError::Config(
                "index name cannot be empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SextantError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            index_name: config.index_name.clone(),
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            host: OnceCell::new(),
        })
    }

    /// The resolved data-plane base URL, if `init` has completed.
    pub fn host(&self) -> Option<&str> {
        self.host.get().map(String::as_str)
    }

    fn data_plane(&self) -> Result<&str> {
        self.host().ok_or_else(|| {
            SextantError::NotInitialized("Index not initialized. Call init() first.".to_string())
        })
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    async fn describe_index(&self) -> Result<String> {
        let url = format!("{}/indexes/{}", self.control_plane_url, self.index_name);
        let resp = self
            .authed(self.client.get(url))
            .send()
            .await
            .map_err(|e| transport_error("Failed to connect to index", e))?;
        let resp = ensure_success(resp, "Describe index").await?;
        let described: DescribeIndexResponse = resp
            .json()
            .await
            .map_err(|e| transport_error("Malformed describe-index response", e))?;

        let host = normalize_host(&described.host);
        info!(index = %self.index_name, host = %host, "Connected to vector index");
        Ok(host)
    }
}

/// Hosts come back without a scheme; test servers include one.
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn init(&self) -> Result<()> {
        self.host
            .get_or_try_init(|| self.describe_index())
            .await
            .map(|_| ())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let base = self.data_plane()?;
        let resp = self
            .authed(self.client.post(format!("{}/describe_index_stats", base)))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| transport_error("Failed to list namespaces", e))?;
        let resp = ensure_success(resp, "List namespaces").await?;
        let stats: DescribeIndexStatsResponse = resp
            .json()
            .await
            .map_err(|e| transport_error("Malformed index stats response", e))?;

        Ok(stats.namespaces.into_keys().collect())
    }

    async fn search_namespace(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<Match>> {
        let base = self.data_plane()?;
        let request = QueryRequest {
            namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let what = format!("Failed to query namespace {}", namespace);

        let resp = self
            .authed(self.client.post(format!("{}/query", base)))
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&what, e))?;
        let resp = ensure_success(resp, &what).await?;
        let parsed: QueryResponse = resp
            .json()
            .await
            .map_err(|e| transport_error(&what, e))?;

        debug!(namespace = %namespace, hits = parsed.matches.len(), "Namespace queried");

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| Match {
                id: m.id,
                score: m.score,
                namespace: namespace.to_string(),
                metadata: m.metadata,
            })
            .collect())
    }
}
