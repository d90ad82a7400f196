//! Cairn document store - retrieval adapter over the Cairn vector index
//!
//! This crate provides:
//! - `CairnStore` façade: batched writes, similarity and MMR search, deletion
//! - Collection lifecycle management (create, poll-until-active, ensure-exists)
//! - Schema translation between documents and the flat wire representation
//! - `Embedder` trait for the external embedding capability, plus a test stub

pub mod collection;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod mmr;
pub mod schema;
pub mod store;

pub use collection::CollectionManager;
pub use config::{SimilarityMetric, StoreConfig};
pub use document::Document;
pub use embedding::{Embedder, MockEmbedder};
pub use error::{StoreError, StoreResult};
pub use store::{CairnStore, DeleteSelector, DocPredicate, Metadatas, MmrOptions, SearchFilter};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{SimilarityMetric, StoreConfig};
    pub use crate::document::Document;
    pub use crate::embedding::Embedder;
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::store::{CairnStore, DeleteSelector, MmrOptions, SearchFilter};
}
