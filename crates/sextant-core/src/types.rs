//! Shared data model for the query pipeline and its HTTP surface.
//!
//! All values are request-scoped: created while serving one search and
//! discarded afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Result cap applied when a query does not request one.
pub const DEFAULT_TOP_K: usize = 10;

/// Hard ceiling on the result cap.
pub const MAX_TOP_K: usize = 100;

// =============================================================================
// Query
// =============================================================================

/// A natural-language search request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query. Must be non-empty after trimming.
    pub query: String,
    /// Requested global result cap.
    pub top_k: Option<usize>,
    /// Explicit namespace restriction. `None` or empty searches every namespace.
    pub namespaces: Option<Vec<String>>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
            namespaces: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = Some(namespaces.into_iter().map(Into::into).collect());
        self
    }

    /// The explicit namespace restriction, if a non-empty one was given.
    pub fn explicit_namespaces(&self) -> Option<&[String]> {
        self.namespaces.as_deref().filter(|ns| !ns.is_empty())
    }
}

/// Clamp a requested result cap into `[1, max]`, substituting `default` when absent.
pub fn effective_top_k(requested: Option<usize>, default: usize, max: usize) -> usize {
    let max = max.max(1);
    requested.unwrap_or(default).clamp(1, max)
}

// =============================================================================
// Vector index
// =============================================================================

/// One vector index hit, tagged with the namespace it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Vector id, which is also the entity's persistent identifier.
    pub id: String,
    /// Similarity score reported by the index.
    pub score: f32,
    /// Originating namespace.
    pub namespace: String,
    /// Opaque index-side metadata.
    #[serde(default)]
    pub metadata: Value,
}

/// The matches returned by one namespace query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceMatches {
    pub namespace: String,
    pub matches: Vec<Match>,
}

impl NamespaceMatches {
    pub fn empty(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            matches: Vec::new(),
        }
    }
}

// =============================================================================
// Entity store
// =============================================================================

/// Pointer document listing the named, content-addressed components of an entity.
///
/// Upstream manifests are loosely shaped. A `null` in any of the scalar
/// fields or in `components` decodes to the empty default, and component
/// values are kept as raw JSON so that a non-string entry does not make the
/// whole manifest unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pi: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ver: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub manifest_cid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cid: Option<String>,
    /// Component name to content address.
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_pi: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_pi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Fields this service does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Manifest {
    /// A manifest with the given id and no components.
    pub fn new(pi: impl Into<String>) -> Self {
        Self {
            pi: pi.into(),
            ver: 1,
            ts: String::new(),
            manifest_cid: String::new(),
            prev_cid: None,
            components: serde_json::Map::new(),
            children_pi: None,
            parent_pi: None,
            note: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, cid: impl Into<String>) -> Self {
        self.components.insert(name.into(), Value::String(cid.into()));
        self
    }

    /// Content address of the named component, if present and a string.
    pub fn component(&self, name: &str) -> Option<&str> {
        self.components.get(name).and_then(Value::as_str)
    }
}

/// An entity resolved from the store: its manifest plus at most one metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    pub pi: String,
    pub manifest: Manifest,
    /// Metadata document, `None` when absent or when fetching it failed.
    pub metadata: Option<Value>,
    /// Content address of the metadata component, when one was named in the manifest.
    pub metadata_cid: Option<String>,
}

// =============================================================================
// Search output
// =============================================================================

/// A ranked match joined with its resolved entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub pi: String,
    pub namespace: String,
    #[serde(rename = "pinecone_metadata", default)]
    pub index_metadata: Value,
    pub manifest: Manifest,
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_cid: Option<String>,
}

impl SearchResult {
    /// Join a match with the entity resolved for its id.
    pub fn join(m: Match, entity: &ResolvedEntity) -> Self {
        Self {
            score: m.score,
            pi: m.id,
            namespace: m.namespace,
            index_metadata: m.metadata,
            manifest: entity.manifest.clone(),
            metadata: entity.metadata.clone(),
            metadata_cid: entity.metadata_cid.clone(),
        }
    }
}

/// The full response to one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query as submitted.
    pub query: String,
    /// Namespaces that were searched.
    pub namespaces: Vec<String>,
    pub total_results: usize,
    pub results: Vec<SearchResult>,
    /// Wall-clock duration of the pipeline.
    pub took_ms: u64,
}

/// Response body of the namespace listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceListing {
    pub namespaces: Vec<String>,
    pub count: usize,
    pub description: BTreeMap<String, String>,
}

impl NamespaceListing {
    pub fn new(namespaces: Vec<String>) -> Self {
        Self {
            count: namespaces.len(),
            namespaces,
            description: namespace_glossary(),
        }
    }
}

/// Static description of each namespace kind.
pub fn namespace_glossary() -> BTreeMap<String, String> {
    [
        ("institution", "Institutional collections"),
        ("collection", "Record collections"),
        ("series", "Record series"),
        ("fileUnit", "File units"),
        (
            "digitalObject",
            "Digital objects (scanned documents, images, etc.)",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
