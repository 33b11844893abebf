//! HTTP client for the Arke entity API and its content-addressed gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use sextant_core::config::EntityConfig;
use sextant_core::error::{Result, SextantError};
use sextant_core::types::Manifest;

use crate::store::EntityStore;

/// Entity store reading manifests from the entity API and components from
/// the gateway.
#[derive(Debug, Clone)]
pub struct ArkeClient {
    client: Client,
    api_base: String,
    gateway_base: String,
}

impl ArkeClient {
    /// Build a client from configuration. `timeout` bounds every request.
    pub fn new(config: &EntityConfig, timeout: Duration) -> Result<Self> {
        if config.api_base.trim().is_empty() || config.gateway_base.trim().is_empty() {
            return Err(SextantError::Config(
                "entity API and gateway base URLs are required".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SextantError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            gateway_base: config.gateway_base.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, url: String, kind: &str, key: &str) -> Result<Response> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            SextantError::Provider(format!("Failed to get {} {}: {}", kind, key, e))
        })?;

        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::NOT_FOUND => Err(SextantError::NotFound(format!(
                "{} not found: {}",
                capitalize(kind),
                key
            ))),
            status => Err(SextantError::Provider(format!(
                "Failed to fetch {} {}: {}",
                kind, key, status
            ))),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl EntityStore for ArkeClient {
    async fn get_manifest(&self, pi: &str) -> Result<Manifest> {
        let url = format!("{}/entities/{}", self.api_base, pi);
        let resp = self.fetch(url, "entity", pi).await?;
        resp.json::<Manifest>().await.map_err(|e| {
            SextantError::Provider(format!("Malformed manifest for {}: {}", pi, e))
        })
    }

    async fn get_component(&self, cid: &str) -> Result<Value> {
        let url = format!("{}/ipfs/{}", self.gateway_base, cid);
        let resp = self.fetch(url, "component", cid).await?;

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        let doc = if is_json {
            resp.json::<Value>().await.map_err(|e| {
                SextantError::Provider(format!("Malformed component {}: {}", cid, e))
            })?
        } else {
            let text = resp.text().await.map_err(|e| {
                SextantError::Provider(format!("Failed to read component {}: {}", cid, e))
            })?;
            Value::String(text)
        };

        debug!(cid = %cid, json = is_json, "Component fetched");
        Ok(doc)
    }
}
