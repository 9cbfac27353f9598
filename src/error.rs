//! Error types for otjson

use thiserror::Error;

/// Result type alias for otjson operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while canonicalizing, committing, encoding or signing
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Empty private object: {0}")]
    EmptyPrivateObject(String),

    #[error("Decode validation failed: {0}")]
    DecodeValidation(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Unsupported origin: {0}")]
    UnsupportedOrigin(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),
}
