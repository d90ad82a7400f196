//! Store error taxonomy and transport classification.

use cairn_client::{ErrorKind, TransportError};
use thiserror::Error;

/// Public error surface of the store layer.
///
/// Every façade method resolves with a success value or fails with exactly
/// one of these variants; callers never see a raw transport error. Variants
/// produced by classification retain the transport failure as their source.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service rejected the credentials (401/403).
    #[error("authentication failed: {0}")]
    Authentication(#[source] TransportError),

    /// The requested remote resource does not exist (404).
    #[error("resource not found: {0}")]
    NotFound(#[source] TransportError),

    /// The service rejected the request as malformed (400).
    #[error("request rejected by the service: {0}")]
    BadRequest(#[source] TransportError),

    /// The service asked us to back off (429).
    #[error("rate limited by the service: {source}")]
    RateLimited {
        /// Seconds the service asked us to wait, when it said.
        retry_after: Option<u64>,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The service was unreachable or answered with a server-side failure.
    #[error("connection error: {0}")]
    Connection(#[source] TransportError),

    /// The service answered with something this client cannot interpret.
    #[error("unexpected service response: {0}")]
    Protocol(#[source] TransportError),

    /// A vector's length does not match the configured dimension.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Configured dimension.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// Vector and document batches differ in length.
    #[error("vector count {vectors} does not match document count {documents}")]
    LengthMismatch {
        /// Number of vectors supplied.
        vectors: usize,
        /// Number of documents supplied.
        documents: usize,
    },

    /// A document's content exceeds the service's size limit.
    #[error("document {index} content length {length} exceeds the {limit}-character limit")]
    DocumentTooLarge {
        /// Index of the offending document in the input batch.
        index: usize,
        /// Its content length in characters.
        length: usize,
        /// The enforced limit.
        limit: usize,
    },

    /// The store configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The given filter kind is not supported by the requested operation.
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// The configured collection does not exist.
    #[error("collection `{0}` does not exist")]
    CollectionMissing(String),

    /// The collection entered a terminal provisioning status.
    #[error("collection `{name}` entered terminal status {status}")]
    CollectionFailed {
        /// Collection name.
        name: String,
        /// The terminal status reported by the service.
        status: String,
    },

    /// The collection did not become active before the deadline.
    #[error("collection `{name}` did not become active within {waited_ms}ms")]
    WaitTimeout {
        /// Collection name.
        name: String,
        /// Milliseconds waited before giving up.
        waited_ms: u64,
    },

    /// The embedding capability failed.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Map a transport failure onto the public taxonomy.
    pub fn from_transport(err: TransportError) -> Self {
        match err.kind() {
            ErrorKind::Auth => Self::Authentication(err),
            ErrorKind::NotFound => Self::NotFound(err),
            ErrorKind::Validation => Self::BadRequest(err),
            ErrorKind::RateLimit => Self::RateLimited {
                retry_after: err.retry_after(),
                source: err,
            },
            ErrorKind::Server | ErrorKind::Connection | ErrorKind::Timeout => Self::Connection(err),
            ErrorKind::Http | ErrorKind::Decode => Self::Protocol(err),
        }
    }
}

impl From<TransportError> for StoreError {
    fn from(err: TransportError) -> Self {
        Self::from_transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, retry_after: Option<u64>) -> TransportError {
        TransportError::Status {
            status: code,
            message: "body".into(),
            retry_after,
        }
    }

    #[test]
    fn statuses_classify_to_taxonomy() {
        assert!(matches!(
            StoreError::from_transport(status(401, None)),
            StoreError::Authentication(_)
        ));
        assert!(matches!(
            StoreError::from_transport(status(403, None)),
            StoreError::Authentication(_)
        ));
        assert!(matches!(
            StoreError::from_transport(status(404, None)),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from_transport(status(400, None)),
            StoreError::BadRequest(_)
        ));
        assert!(matches!(
            StoreError::from_transport(status(503, None)),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            StoreError::from_transport(status(418, None)),
            StoreError::Protocol(_)
        ));
    }

    #[test]
    fn rate_limit_carries_hint() {
        match StoreError::from_transport(status(429, Some(7))) {
            StoreError::RateLimited { retry_after, .. } => assert_eq!(retry_after, Some(7)),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn network_failures_classify_to_connection() {
        assert!(matches!(
            StoreError::from_transport(TransportError::Connect("refused".into())),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            StoreError::from_transport(TransportError::Timeout("deadline".into())),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            StoreError::from_transport(TransportError::Decode("bad json".into())),
            StoreError::Protocol(_)
        ));
    }
}
