//! Error types and handlers for registry operations

pub mod handlers;

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Network related errors (connection refused, DNS, timeouts)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Registry answered with a non-success status
    #[error("status: {status} - {message}")]
    Http { status: u16, message: String },

    /// Resource not found (HTTP 404)
    #[error("status: 404 - Not Found ({0})")]
    NotFound(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Atomic or chunked upload rejected; wraps the underlying failure
    #[error("Upload of {filename} failed: {source}")]
    UploadFailed {
        filename: String,
        #[source]
        source: Box<RegistryError>,
    },

    /// Status never reached a terminal condition within the attempt budget
    #[error("Timed out after {attempts} attempts ({elapsed:?}) waiting for {target}")]
    PollTimeout {
        target: String,
        attempts: u32,
        elapsed: Duration,
    },

    /// Invalid input (references, sort keys, file paths)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// File IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Response parse errors
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RegistryError {
    /// Wrap `err` as the cause of a failed upload of `filename`.
    pub fn upload_failed(filename: impl Into<String>, err: RegistryError) -> Self {
        RegistryError::UploadFailed {
            filename: filename.into(),
            source: Box::new(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::NotFound(_) | RegistryError::Http { status: 404, .. }
        )
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        handlers::NetworkErrorHandler::handle_network_error(&err, "request")
    }
}

impl From<url::ParseError> for RegistryError {
    fn from(err: url::ParseError) -> Self {
        RegistryError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_matches_status_line() {
        let err = RegistryError::NotFound("acme/repo/abc".to_string());
        assert!(err.to_string().contains("status: 404 - Not Found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_http_404_counts_as_not_found() {
        let err = RegistryError::Http {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!RegistryError::Transport("reset".to_string()).is_not_found());
    }

    #[test]
    fn test_upload_failed_keeps_source() {
        use std::error::Error as _;

        let err = RegistryError::upload_failed(
            "big.bin",
            RegistryError::Transport("connection reset".to_string()),
        );
        assert!(err.to_string().contains("big.bin"));
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("connection reset"));
    }
}
