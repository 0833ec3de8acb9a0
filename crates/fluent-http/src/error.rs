//! HTTP client error types

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// Header name or value rejected while building the request
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Request body could not be encoded
    #[error("Failed to serialize request body: {0}")]
    Serialization(String),

    /// Response text is not valid encoded data for the requested type
    #[error("Failed to deserialize response body: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),

    /// Blocking runtime could not be started
    #[error("Failed to start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HttpError {
    /// Whether the error means the exchange itself did not complete
    ///
    /// Everything except deserialization and configuration problems ends up
    /// on the transport-failure path of a send.
    pub fn is_transport(&self) -> bool {
        !matches!(self, HttpError::Deserialization(_) | HttpError::Config(_))
    }
}
