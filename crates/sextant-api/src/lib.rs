//! Sextant API crate - axum HTTP server and route handlers.
//!
//! Exposes the search pipeline as `POST /`, namespace discovery as
//! `GET /namespaces`, and a liveness probe at `GET /health`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
