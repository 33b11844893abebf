//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use sextant_search::SearchPipeline;

/// Shared application state.
///
/// Cloned into every handler task; the pipeline itself is stateless per
/// request, so no locking is needed.
#[derive(Clone)]
pub struct AppState {
    /// The query pipeline (embed, fan out, merge, resolve).
    pub pipeline: Arc<SearchPipeline>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: SearchPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
        }
    }
}
