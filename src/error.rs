// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Document contains no usable passages")]
    EmptyDocument,

    #[error("Query transformation '{operation}' failed: {message}")]
    TransformFailure { operation: String, message: String },

    #[error("Generation unavailable after {attempts} attempt(s): {message}")]
    UpstreamUnavailable { attempts: u32, message: String },

    #[error("Malformed model output: {0}")]
    MalformedUpstreamOutput(String),

    #[error("Generation call failed: {0}")]
    Upstream(String),

    #[error("Generation call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Audit persistence error: {0}")]
    Audit(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scrape failed: {0}")]
    Scrape(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    pub fn transform(operation: &str, message: impl Into<String>) -> Self {
        RagError::TransformFailure {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Status code the HTTP collaborator should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RagError::Validation(_) | RagError::EmptyDocument => 400,
            RagError::UpstreamUnavailable { .. } | RagError::Timeout(_) | RagError::Upstream(_) => {
                503
            }
            RagError::Scrape(_) => 502,
            _ => 500,
        }
    }
}
