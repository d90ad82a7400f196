//! Wire types for the Cairn index HTTP API.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat key/value document exchanged with the service.
///
/// Holds the id field, the text field, the vector field, and every metadata
/// entry spread alongside them.
pub type WireDoc = Map<String, Value>;

/// Lifecycle state of a remote collection.
///
/// Unrecognized statuses are preserved verbatim and treated as not yet ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CollectionStatus {
    /// The collection is being provisioned.
    Creating,
    /// The collection is ready for reads and writes.
    Active,
    /// Provisioning failed terminally.
    Failed,
    /// The collection entered an error state.
    Error,
    /// Any status string this client does not recognize.
    Other(String),
}

impl From<String> for CollectionStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "CREATING" => Self::Creating,
            "ACTIVE" => Self::Active,
            "FAILED" => Self::Failed,
            "ERROR" => Self::Error,
            _ => Self::Other(raw),
        }
    }
}

impl From<CollectionStatus> for String {
    fn from(status: CollectionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl CollectionStatus {
    /// The service's wire spelling of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
            Self::Other(raw) => raw,
        }
    }

    /// Whether this status is a terminal provisioning failure.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection metadata returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    /// Current lifecycle status.
    pub status: CollectionStatus,
    /// Number of documents in the collection.
    #[serde(default)]
    pub num_docs: u64,
    /// Index configuration the collection was created with.
    #[serde(default)]
    pub index_configs: Map<String, Value>,
}

/// One entry of the collection listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    /// Collection name.
    pub name: String,
    /// Status, when the listing includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CollectionStatus>,
}

/// Body of the collection listing response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCollectionsResponse {
    /// Known collections.
    #[serde(default)]
    pub collections: Vec<CollectionSummary>,
}

/// Request body for collection creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    /// Collection name.
    pub name: String,
    /// Per-field index configuration.
    pub index_configs: Map<String, Value>,
}

/// Request body for a document upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertDocsRequest {
    /// Documents to upsert, flat wire form.
    pub docs: Vec<WireDoc>,
}

/// Request body for deletion by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDocsRequest {
    /// Ids of the documents to delete.
    pub ids: Vec<String>,
}

/// Request body for the paginated document listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocsRequest {
    /// Cursor from the previous page, absent for the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Maximum number of documents per page.
    pub limit: usize,
}

/// One page of the paginated document listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocPage {
    /// Documents on this page.
    #[serde(default)]
    pub docs: Vec<WireDoc>,
    /// Cursor for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// The KNN clause of a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnnQuery {
    /// Name of the vector field to search.
    pub field: String,
    /// Query vector; length must match the collection's dimension.
    pub query_vector: Vec<f32>,
    /// Number of neighbors to retrieve.
    pub k: usize,
    /// Server-side field filter, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
}

/// Wrapper for the query clause, matching the service's request shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryClause {
    /// The KNN clause.
    pub knn: KnnQuery,
}

/// Request body for a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Number of results to return.
    pub size: usize,
    /// Query clause.
    pub query: QueryClause,
    /// Whether to require read-after-write consistency.
    pub consistent_read: bool,
    /// Whether result documents should include their vector field.
    #[serde(default)]
    pub include_vectors: bool,
}

/// One scored result of a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDoc {
    /// The matched document, flat wire form.
    pub doc: WireDoc,
    /// Similarity score; absent when the service omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Response body of a similarity query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Scored results in server ranking order.
    #[serde(default)]
    pub docs: Vec<ScoredDoc>,
}
