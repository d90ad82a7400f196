//! Store configuration and its authoritative defaults.

use std::env;
use std::time::Duration;

use cairn_client::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.cairn.dev";

/// Default wire field holding a document's text content.
pub const DEFAULT_TEXT_FIELD: &str = "text";

/// Default wire field holding a document's vector.
pub const DEFAULT_VECTOR_FIELD: &str = "vector";

/// Default read-consistency mode for queries.
pub const DEFAULT_CONSISTENT_READ: bool = false;

/// Maximum accepted document content length, in characters.
pub const MAX_CONTENT_LENGTH: usize = 50_000;

/// Number of documents per upsert request.
pub const UPSERT_CHUNK_SIZE: usize = 100;

/// Number of documents per page of the scan used by filtered deletion.
pub const SCAN_PAGE_SIZE: usize = 100;

/// Default per-request network timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default interval between collection status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default overall deadline for a collection to become active.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Similarity metric used by the collection's vector index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimilarityMetric {
    /// Cosine similarity.
    #[default]
    Cosine,
    /// Euclidean distance.
    Euclidean,
    /// Dot product.
    DotProduct,
    /// Maximum inner product.
    MaxInnerProduct,
}

impl SimilarityMetric {
    /// The service's wire spelling of this metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dotProduct",
            Self::MaxInnerProduct => "maxInnerProduct",
        }
    }
}

/// Immutable store configuration, captured at construction.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project API key.
    pub api_key: String,
    /// Service base URL.
    pub base_url: String,
    /// Collection name.
    pub collection: String,
    /// Vector dimensionality; every vector submitted or queried must match.
    pub dimension: usize,
    /// Similarity metric for the collection's vector index.
    pub metric: SimilarityMetric,
    /// Extra index configuration merged additively into collection creation.
    pub index_configs: Map<String, Value>,
    /// Wire field holding a document's text content.
    pub text_field: String,
    /// Wire field holding a document's vector.
    pub vector_field: String,
    /// Verify the collection exists while constructing the store.
    pub check_collection_on_init: bool,
    /// Read-consistency mode applied to queries.
    pub consistent_read: bool,
    /// Per-request network timeout, in seconds.
    pub timeout_secs: u64,
    /// Retry policy applied uniformly to remote calls.
    pub retry: RetryPolicy,
    /// Interval between collection status polls.
    pub poll_interval: Duration,
    /// Overall deadline for a collection to become active.
    pub wait_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            collection: String::new(),
            dimension: 1536,
            metric: SimilarityMetric::default(),
            index_configs: Map::new(),
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
            check_collection_on_init: false,
            consistent_read: DEFAULT_CONSISTENT_READ,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Configuration for the given credentials, collection, and dimension.
    pub fn new(
        api_key: impl Into<String>,
        collection: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            collection: collection.into(),
            dimension,
            ..Default::default()
        }
    }

    /// Configuration from `CAIRN_API_KEY`, `CAIRN_COLLECTION`, and
    /// `CAIRN_DIMENSION`, with `CAIRN_URL` as an optional endpoint override.
    pub fn from_env() -> Self {
        let api_key =
            env::var("CAIRN_API_KEY").expect("CAIRN_API_KEY environment variable must be set");
        let collection = env::var("CAIRN_COLLECTION")
            .expect("CAIRN_COLLECTION environment variable must be set");
        let dimension = env::var("CAIRN_DIMENSION")
            .expect("CAIRN_DIMENSION environment variable must be set")
            .parse::<usize>()
            .expect("CAIRN_DIMENSION must be a positive integer");
        let base_url = env::var("CAIRN_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            base_url,
            ..Self::new(api_key, collection, dimension)
        }
    }

    /// Override the service endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the similarity metric.
    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Merge extra index configuration into collection creation.
    pub fn with_index_configs(mut self, configs: Map<String, Value>) -> Self {
        self.index_configs = configs;
        self
    }

    /// Override the wire field holding text content.
    pub fn with_text_field(mut self, field: impl Into<String>) -> Self {
        self.text_field = field.into();
        self
    }

    /// Override the wire field holding vectors.
    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = field.into();
        self
    }

    /// Verify the collection exists while constructing the store.
    pub fn with_check_collection_on_init(mut self, check: bool) -> Self {
        self.check_collection_on_init = check;
        self
    }

    /// Set the read-consistency mode applied to queries.
    pub fn with_consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = consistent;
        self
    }

    /// Override the per-request network timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the collection status poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the deadline for a collection to become active.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Fail fast on configuration this store cannot operate with.
    pub fn validate(&self) -> StoreResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "api key must not be empty".to_string(),
            ));
        }
        if self.collection.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "collection name must not be empty".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(StoreError::InvalidConfig(
                "vector dimension must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
