//! Cairn index service client
//!
//! This crate provides:
//! - `IndexApi` trait abstracting the service's HTTP surface
//! - `CairnClient`, the reqwest-backed implementation
//! - `with_retry`, bounded exponential-backoff retry for remote calls
//! - A closed transport error union with a retryability vocabulary
//! - `MockIndexApi`, a scripted stub for tests

pub mod api;
pub mod error;
pub mod http;
pub mod retry;
pub mod types;

pub use api::{IndexApi, MockIndexApi};
pub use error::{ApiResult, ErrorKind, TransportError};
pub use http::{CairnClient, ClientConfig};
pub use retry::{with_retry, RetryPolicy};
pub use types::{
    CollectionInfo, CollectionStatus, CollectionSummary, CreateCollectionRequest,
    DeleteDocsRequest, DocPage, KnnQuery, ListCollectionsResponse, ListDocsRequest, QueryClause,
    QueryRequest, QueryResponse, ScoredDoc, UpsertDocsRequest, WireDoc,
};

/// Prelude for common imports
pub mod prelude {
    pub use crate::api::IndexApi;
    pub use crate::error::{ApiResult, ErrorKind, TransportError};
    pub use crate::http::{CairnClient, ClientConfig};
    pub use crate::retry::{with_retry, RetryPolicy};
    pub use crate::types::{CollectionInfo, CollectionStatus, QueryRequest, WireDoc};
}
