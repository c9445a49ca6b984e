use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types shared by the object client and the benchmark harness
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchError {
    #[error("HTTP {0}: {1}")]
    Http(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    /// The result stream was closed while a worker still had a result to deliver.
    #[error("Result stream closed before all workers finished")]
    StreamClosed,
}

impl BenchError {
    /// Short label used when tallying outcomes: the status code for HTTP
    /// failures, a kind name otherwise.
    pub fn outcome_label(&self) -> String {
        match self {
            BenchError::Http(status, _) => status.to_string(),
            BenchError::Network(_) => "network".to_string(),
            BenchError::BucketNotFound(_) | BenchError::ObjectNotFound(_) => "not_found".to_string(),
            BenchError::Cancelled => "cancelled".to_string(),
            BenchError::Config(_) | BenchError::StreamClosed => "error".to_string(),
        }
    }
}

/// JSON error envelope an object endpoint may return with an error status
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// The object endpoint a run is pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Base URL including scheme, e.g. `http://127.0.0.1:9000`.
    pub base_url: String,
    pub bucket: String,
}

/// Result type for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;
