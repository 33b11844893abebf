//! Route handler functions for all API endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use sextant_core::types::{NamespaceListing, SearchQuery, SearchResponse};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for `POST /`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Any JSON number; fractional values are truncated after the range check.
    #[serde(default, rename = "topK")]
    pub top_k: Option<f64>,
    #[serde(default)]
    pub namespaces: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST / - run a search.
///
/// The body is parsed by hand so that a missing content type or malformed
/// JSON is a 400 like any other invalid request.
pub async fn search(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SearchResponse>, ApiError> {
    let req: SearchRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    let query = req
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing or invalid \"query\" field".to_string()))?;

    let max = state.pipeline.max_top_k();
    let top_k = req
        .top_k
        .map(|k| {
            if k.is_finite() && k >= 1.0 && k <= max as f64 {
                Ok(k.trunc() as usize)
            } else {
                Err(ApiError::BadRequest(format!(
                    "Invalid \"topK\" value. Must be between 1 and {}.",
                    max
                )))
            }
        })
        .transpose()?;

    let search_query = SearchQuery {
        query,
        top_k,
        namespaces: req.namespaces,
    };

    let response = state.pipeline.search(search_query).await.map_err(|e| {
        error!(error = %e, "Search failed");
        ApiError::from(e)
    })?;

    info!(
        results = response.total_results,
        took_ms = response.took_ms,
        "Search served"
    );
    Ok(Json(response))
}

/// GET /namespaces - list the namespaces present in the index.
pub async fn namespaces(
    State(state): State<AppState>,
) -> Result<Json<NamespaceListing>, ApiError> {
    let namespaces = state.pipeline.list_namespaces().await.map_err(|e| {
        error!(error = %e, "Namespace listing failed");
        ApiError::Internal(format!("Failed to list namespaces: {}", e))
    })?;

    Ok(Json(NamespaceListing::new(namespaces)))
}

/// GET /health - liveness and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Fallback for unknown paths and unsupported methods on known paths.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed(
        "Method not allowed or invalid path. Use POST / for search or GET /namespaces."
            .to_string(),
    )
}
