//! Error types for WebMap conversion.

use thiserror::Error;

/// Result type alias using WebMapError.
pub type WebMapResult<T> = Result<T, WebMapError>;

/// Primary error type for WebMap loading and conversion.
#[derive(Debug, Error)]
pub enum WebMapError {
    // === Document Errors ===
    #[error("Invalid WebMap document: {0}")]
    InvalidDocument(String),

    #[error("WebMap document has no operationalLayers list")]
    MissingOperationalLayers,

    #[error("Invalid operational layer '{title}': {message}")]
    InvalidLayer { title: String, message: String },

    // === Service Errors ===
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Service returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("ArcGIS error: {0}")]
    ArcGis(String),

    // === Infrastructure Errors ===
    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl WebMapError {
    /// Whether the error means the whole batch is unusable, as opposed to
    /// a single layer or service being unavailable.
    pub fn is_batch_error(&self) -> bool {
        matches!(
            self,
            WebMapError::InvalidDocument(_) | WebMapError::MissingOperationalLayers
        )
    }
}

impl From<std::io::Error> for WebMapError {
    fn from(err: std::io::Error) -> Self {
        WebMapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for WebMapError {
    fn from(err: serde_json::Error) -> Self {
        WebMapError::Json(err.to_string())
    }
}
