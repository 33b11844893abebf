use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SextantError};
use crate::types::MAX_TOP_K;

/// Top-level configuration for the Sextant search service.
///
/// Loaded from `~/.sextant/config.toml` by default. Secrets are normally
/// supplied through the environment (see [`SextantConfig::apply_env`]) rather
/// than written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SextantConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub entity: EntityConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl SextantConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SextantConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay secrets and endpoints from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.embedding.api_key = v;
        }
        if let Some(v) = get("PINECONE_API_KEY") {
            self.index.api_key = v;
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.index.index_name = v;
        }
        if let Some(v) = get("ARKE_API_BASE") {
            self.entity.api_base = v;
        }
        if let Some(v) = get("ARKE_GATEWAY_BASE") {
            self.entity.gateway_base = v;
        }
        if let Some(port) = get("SEXTANT_PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
    }

    /// Check that every required secret and endpoint is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("embedding.api_key", &self.embedding.api_key),
            ("index.api_key", &self.index.api_key),
            ("index.index_name", &self.index.index_name),
            ("entity.api_base", &self.entity.api_base),
            ("entity.gateway_base", &self.entity.gateway_base),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(SextantError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }
        if self.search.max_top_k == 0 || self.search.default_top_k == 0 {
            return Err(SextantError::Config(
                "search.default_top_k and search.max_top_k must be at least 1".to_string(),
            ));
        }
        if self.search.max_top_k > MAX_TOP_K {
            return Err(SextantError::Config(format!(
                "search.max_top_k ({}) exceeds the hard ceiling of {}",
                self.search.max_top_k, MAX_TOP_K
            )));
        }
        if self.search.default_top_k > self.search.max_top_k {
            return Err(SextantError::Config(format!(
                "search.default_top_k ({}) exceeds search.max_top_k ({})",
                self.search.default_top_k, self.search.max_top_k
            )));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            log_level: "info".to_string(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider API key.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Provider base URL.
    pub base_url: String,
    /// Embedding model name.
    pub model: String,
    /// Requested embedding dimension.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 768,
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index API key.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Name of the index to query.
    pub index_name: String,
    /// Control-plane URL used to resolve the index host.
    pub control_plane_url: String,
    /// Value of the API version header.
    pub api_version: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: String::new(),
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
        }
    }
}

/// Entity store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Base URL of the manifest API.
    pub api_base: String,
    /// Base URL of the content-addressed gateway.
    pub gateway_base: String,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.arke.institute".to_string(),
            gateway_base: "https://ipfs.arke.institute".to_string(),
        }
    }
}

/// Search pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result cap when the request does not specify one.
    pub default_top_k: usize,
    /// Hard ceiling on the result cap.
    pub max_top_k: usize,
    /// Timeout applied to every upstream HTTP call, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            max_top_k: 100,
            request_timeout_secs: 30,
        }
    }
}
