//! Integration tests for the Sextant API.
//!
//! Each test builds its own router over in-memory adapters and drives it
//! with `oneshot`, covering the search contract, partial-failure behavior,
//! namespace listing, CORS and method handling.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use sextant_api::create_router;
use sextant_api::error::ErrorBody;
use sextant_api::handlers::HealthResponse;
use sextant_api::state::AppState;
use sextant_core::config::SearchConfig;
use sextant_core::types::{Manifest, NamespaceListing, SearchResponse};
use sextant_entity::InMemoryEntityStore;
use sextant_search::SearchPipeline;
use sextant_vector::{InMemoryIndex, MockEmbedding};

// =============================================================================
// Helpers
// =============================================================================

/// Adapters behind one router, kept so tests can inject failures and read
/// call counters.
struct Harness {
    index: InMemoryIndex,
    store: InMemoryEntityStore,
}

impl Harness {
    fn new() -> Self {
        Self {
            index: InMemoryIndex::new(),
            store: InMemoryEntityStore::new(),
        }
    }

    /// Index `pi` in `namespace` so that its similarity to the query is `score`,
    /// and register a manifest with a metadata component.
    fn entity(&self, namespace: &str, pi: &str, score: f32) {
        let embedding = vec![score, (1.0 - score * score).max(0.0).sqrt()];
        self.index
            .insert(namespace, pi, embedding, json!({ "pi": pi, "namespace": namespace }))
            .unwrap();
        let cid = format!("bafy{}", pi);
        self.store
            .insert_manifest(Manifest::new(pi).with_component("metadata", cid.as_str()));
        self.store
            .insert_component(&cid, json!({ "title": format!("Record {}", pi) }));
    }

    fn app(&self) -> axum::Router {
        let pipeline = SearchPipeline::new(
            Arc::new(MockEmbedding::fixed(vec![1.0, 0.0])),
            Arc::new(self.index.clone()),
            Arc::new(self.store.clone()),
        );
        create_router(AppState::new(pipeline))
    }
}

/// Twelve entities across three namespaces.
fn populated() -> Harness {
    let h = Harness::new();
    for i in 0..4 {
        let step = i as f32 * 0.2;
        h.entity("collection", &format!("c{}", i), 0.95 - step);
        h.entity("series", &format!("s{}", i), 0.90 - step);
        h.entity("fileUnit", &format!("f{}", i), 0.85 - step);
    }
    h
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn search(app: axum::Router, body: Value) -> SearchResponse {
    let resp = app.oneshot(post_json("/", &body.to_string())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

async fn expect_error(app: axum::Router, req: Request<Body>, status: StatusCode) -> ErrorBody {
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), status);
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// =============================================================================
// POST /
// =============================================================================

#[tokio::test]
async fn test_search_happy_path() {
    let h = populated();
    let resp = search(h.app(), json!({ "query": "draft cards", "topK": 3 })).await;

    assert_eq!(resp.query, "draft cards");
    assert_eq!(resp.total_results, 3);
    let ids: Vec<&str> = resp.results.iter().map(|r| r.pi.as_str()).collect();
    assert_eq!(ids, vec!["c0", "s0", "f0"]);
    assert_eq!(resp.namespaces, vec!["collection", "fileUnit", "series"]);
}

#[tokio::test]
async fn test_search_result_shape() {
    let h = populated();
    let resp = h
        .app()
        .oneshot(post_json("/", r#"{"query":"letters","topK":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let first = &body["results"][0];
    assert_eq!(first["pi"], "c0");
    assert_eq!(first["namespace"], "collection");
    assert_eq!(first["pinecone_metadata"]["pi"], "c0");
    assert_eq!(first["manifest"]["pi"], "c0");
    assert_eq!(first["metadata"]["title"], "Record c0");
    assert_eq!(first["metadata_cid"], "bafyc0");
    assert!(body["took_ms"].is_u64());
}

#[tokio::test]
async fn test_search_default_top_k() {
    let h = populated();
    let resp = search(h.app(), json!({ "query": "letters" })).await;

    assert_eq!(resp.total_results, 10);
    assert!(resp.results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_search_top_k_out_of_range() {
    let h = populated();
    for top_k in [json!(0), json!(150), json!(-3)] {
        let body = json!({ "query": "letters", "topK": top_k }).to_string();
        let err = expect_error(h.app(), post_json("/", &body), StatusCode::BAD_REQUEST).await;
        assert_eq!(err.error, "bad_request");
        assert!(err.message.contains("topK"));
    }
}

#[tokio::test]
async fn test_search_top_k_upper_bound_accepted() {
    let h = populated();
    let resp = search(h.app(), json!({ "query": "letters", "topK": 100 })).await;
    assert_eq!(resp.total_results, 12);
}

#[tokio::test]
async fn test_search_fractional_top_k() {
    let h = populated();
    let resp = search(h.app(), json!({ "query": "letters", "topK": 10.0 })).await;
    assert_eq!(resp.total_results, 10);

    let resp = search(h.app(), json!({ "query": "letters", "topK": 2.7 })).await;
    assert_eq!(resp.total_results, 2);

    let body = json!({ "query": "letters", "topK": 100.5 }).to_string();
    expect_error(h.app(), post_json("/", &body), StatusCode::BAD_REQUEST).await;
    let body = json!({ "query": "letters", "topK": 0.5 }).to_string();
    expect_error(h.app(), post_json("/", &body), StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_search_top_k_ceiling_holds_with_oversized_config() {
    let h = populated();
    let config = SearchConfig {
        default_top_k: 10,
        max_top_k: 500,
        request_timeout_secs: 30,
    };
    let pipeline = SearchPipeline::new(
        Arc::new(MockEmbedding::fixed(vec![1.0, 0.0])),
        Arc::new(h.index.clone()),
        Arc::new(h.store.clone()),
    )
    .with_limits(&config);
    let app = create_router(AppState::new(pipeline));

    let body = json!({ "query": "letters", "topK": 150 }).to_string();
    let err = expect_error(app, post_json("/", &body), StatusCode::BAD_REQUEST).await;
    assert!(err.message.contains("between 1 and 100"));
}

#[tokio::test]
async fn test_search_missing_query() {
    let h = populated();
    let err = expect_error(h.app(), post_json("/", r#"{"topK":5}"#), StatusCode::BAD_REQUEST).await;
    assert!(err.message.contains("query"));
}

#[tokio::test]
async fn test_search_blank_query() {
    let h = populated();
    expect_error(h.app(), post_json("/", r#"{"query":"   "}"#), StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_search_malformed_json() {
    let h = populated();
    expect_error(h.app(), post_json("/", "{not json"), StatusCode::BAD_REQUEST).await;
    expect_error(h.app(), post_json("/", r#"{"query":42}"#), StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_search_explicit_namespaces() {
    let h = populated();
    let resp = search(
        h.app(),
        json!({ "query": "letters", "namespaces": ["series", "doesNotExist"] }),
    )
    .await;

    assert_eq!(resp.namespaces, vec!["series", "doesNotExist"]);
    assert_eq!(resp.total_results, 4);
    assert!(resp.results.iter().all(|r| r.namespace == "series"));
}

#[tokio::test]
async fn test_search_empty_namespaces_searches_all() {
    let h = populated();
    let resp = search(h.app(), json!({ "query": "letters", "namespaces": [] })).await;
    assert_eq!(resp.namespaces.len(), 3);
}

#[tokio::test]
async fn test_search_degraded_namespace_still_succeeds() {
    let h = populated();
    h.index.fail_namespace("collection");

    let resp = search(h.app(), json!({ "query": "letters", "topK": 100 })).await;

    assert_eq!(resp.total_results, 8);
    assert!(resp.results.iter().all(|r| r.namespace != "collection"));
}

#[tokio::test]
async fn test_search_drops_unresolvable_entity() {
    let h = populated();
    h.store.fail_manifest("s0");

    let resp = search(h.app(), json!({ "query": "letters", "topK": 3 })).await;

    let ids: Vec<&str> = resp.results.iter().map(|r| r.pi.as_str()).collect();
    assert_eq!(ids, vec!["c0", "f0"]);
    assert_eq!(resp.total_results, 2);
}

#[tokio::test]
async fn test_search_no_matches_skips_resolution() {
    let h = Harness::new();
    let resp = search(h.app(), json!({ "query": "letters" })).await;

    assert!(resp.results.is_empty());
    assert_eq!(resp.total_results, 0);
    assert_eq!(h.store.manifest_calls(), 0);
}

#[tokio::test]
async fn test_search_discovery_failure_is_500() {
    let h = populated();
    h.index.fail_listing("stats endpoint unavailable");

    let err = expect_error(
        h.app(),
        post_json("/", r#"{"query":"letters"}"#),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await;
    assert_eq!(err.error, "internal_error");
    assert!(err.message.contains("stats endpoint unavailable"));
}

#[tokio::test]
async fn test_search_discovery_failure_ignored_with_explicit_namespaces() {
    let h = populated();
    h.index.fail_listing("stats endpoint unavailable");

    let resp = search(h.app(), json!({ "query": "letters", "namespaces": ["fileUnit"] })).await;
    assert_eq!(resp.total_results, 4);
}

#[tokio::test]
async fn test_search_without_content_type() {
    let h = populated();
    let req = Request::post("/")
        .body(Body::from(r#"{"query":"letters","topK":2}"#))
        .unwrap();
    let resp = h.app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_body_too_large() {
    let h = populated();
    let padding = "x".repeat(2 * 1024 * 1024);
    let body = json!({ "query": padding }).to_string();
    let resp = h.app().oneshot(post_json("/", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// GET /namespaces
// =============================================================================

#[tokio::test]
async fn test_namespaces_happy_path() {
    let h = populated();
    let resp = h.app().oneshot(get("/namespaces")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let listing: NamespaceListing = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(listing.namespaces, vec!["collection", "fileUnit", "series"]);
    assert_eq!(listing.count, 3);
    assert!(listing.description.contains_key("digitalObject"));
    assert!(listing.description.contains_key("institution"));
}

#[tokio::test]
async fn test_namespaces_listing_failure() {
    let h = populated();
    h.index.fail_listing("control plane down");

    let err = expect_error(h.app(), get("/namespaces"), StatusCode::INTERNAL_SERVER_ERROR).await;
    assert!(err.message.starts_with("Failed to list namespaces"));
}

// =============================================================================
// Health, CORS, method handling
// =============================================================================

#[tokio::test]
async fn test_health() {
    let h = Harness::new();
    let resp = h.app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_options_is_preflight() {
    let h = Harness::new();
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/")
        .header("origin", "https://example.org")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let resp = h.app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let methods = resp.headers()["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("GET"));
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn test_options_on_unknown_path() {
    let h = Harness::new();
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/anything")
        .body(Body::empty())
        .unwrap();
    let resp = h.app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_header_on_search() {
    let h = populated();
    let req = Request::post("/")
        .header("origin", "https://example.org")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"query":"letters"}"#))
        .unwrap();
    let resp = h.app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_get_root_is_405() {
    let h = Harness::new();
    let err = expect_error(h.app(), get("/"), StatusCode::METHOD_NOT_ALLOWED).await;
    assert_eq!(err.error, "method_not_allowed");
}

#[tokio::test]
async fn test_post_namespaces_is_405() {
    let h = Harness::new();
    expect_error(h.app(), post_json("/namespaces", "{}"), StatusCode::METHOD_NOT_ALLOWED).await;
}

#[tokio::test]
async fn test_unknown_path_is_405() {
    let h = Harness::new();
    expect_error(h.app(), get("/search"), StatusCode::METHOD_NOT_ALLOWED).await;
}
