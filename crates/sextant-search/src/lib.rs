//! Sextant Search crate - the query pipeline.
//!
//! Turns one natural-language query into parallel per-namespace vector
//! searches, merges them into a global top-K, then resolves and joins the
//! matching entities. Failures inside a fan-out branch are absorbed; only
//! failures that make the whole response meaningless abort the request.

pub mod pipeline;
pub mod rank;

pub use pipeline::SearchPipeline;
pub use rank::{join_entities, merge_rank, unique_ids};
