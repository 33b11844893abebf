//! Sextant Entity crate - resolves persistent identifiers to manifests and metadata.
//!
//! `EntityStore` abstracts the content-addressed entity store. The provided
//! `resolve_entity` / `resolve_entities` methods implement metadata lookup
//! and the batch fan-out on top of any store.

pub mod arke;
pub mod memory;
pub mod store;

pub use arke::ArkeClient;
pub use memory::InMemoryEntityStore;
pub use store::{find_metadata_component, EntityStore, METADATA_COMPONENTS};
