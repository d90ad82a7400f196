//! Transport error union for the Cairn HTTP API.

use thiserror::Error;

/// Closed set of failures produced by the transport layer.
///
/// Every remote call resolves to a success value or to exactly one of these
/// variants; higher layers never see a raw `reqwest` error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The service answered with a non-success HTTP status.
    #[error("http status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        message: String,
        /// Seconds parsed from a `retry-after` header, when present.
        retry_after: Option<u64>,
    },

    /// Connection refused, DNS failure, or any other failure to reach the host.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The network-level request timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Retryability vocabulary derived from a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401 / 403
    Auth,
    /// 404
    NotFound,
    /// 400
    Validation,
    /// 429
    RateLimit,
    /// 500 / 502 / 503 / 504
    Server,
    /// Any other HTTP status.
    Http,
    /// Failure to reach the host.
    Connection,
    /// Network-level timeout.
    Timeout,
    /// Undecodable response.
    Decode,
}

impl TransportError {
    /// Classify this failure into the closed retryability vocabulary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Status { status, .. } => match status {
                401 | 403 => ErrorKind::Auth,
                404 => ErrorKind::NotFound,
                400 => ErrorKind::Validation,
                429 => ErrorKind::RateLimit,
                500 | 502 | 503 | 504 => ErrorKind::Server,
                _ => ErrorKind::Http,
            },
            Self::Connect(_) => ErrorKind::Connection,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Retry-after hint in seconds, when the service supplied one.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type for transport operations.
pub type ApiResult<T> = Result<T, TransportError>;
