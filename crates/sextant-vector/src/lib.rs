//! Sextant Vector crate - embedding provider and vector index adapters.
//!
//! Wraps the external embedding provider and the multi-namespace vector
//! index behind async traits, with HTTP-backed production implementations
//! and in-memory implementations for testing.

mod http;

pub mod embedding;
pub mod index;
pub mod pinecone;

pub use embedding::{EmbeddingProvider, MockEmbedding, OpenAiEmbedding};
pub use index::{InMemoryIndex, VectorIndex};
pub use pinecone::PineconeIndex;
