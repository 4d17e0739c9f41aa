//! Standardized error handling patterns for registry responses

use crate::error::{RegistryError, Result};
use reqwest::StatusCode;
use std::path::Path;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Map a non-success registry response to an error
    pub fn handle_registry_error(status: StatusCode, error_text: &str, operation: &str) -> RegistryError {
        let detail = Self::extract_detail(error_text);
        match status.as_u16() {
            401 => RegistryError::Auth(format!(
                "Unauthorized to perform {}: {}",
                operation, detail
            )),
            403 => RegistryError::Auth(format!(
                "Forbidden: insufficient permissions for {}: {}",
                operation, detail
            )),
            404 => RegistryError::NotFound(format!("{}: {}", operation, detail)),
            code => RegistryError::Http {
                status: code,
                message: match code {
                    400 => format!("Bad request during {}: {}", operation, detail),
                    413 => format!("File too large for {}: {}", operation, detail),
                    422 => format!("Invalid data for {}: {}", operation, detail),
                    429 => format!("Rate limited during {}: {}", operation, detail),
                    500 => format!("Registry server error during {}: {}", operation, detail),
                    502 | 503 => format!("Registry unavailable for {}: {}", operation, detail),
                    _ => format!(
                        "{} - {} failed: {}",
                        status.canonical_reason().unwrap_or("Unknown"),
                        operation,
                        detail
                    ),
                },
            },
        }
    }

    /// Registry errors come back as `{"detail": "..."}`; fall back to the raw body
    fn extract_detail(error_text: &str) -> String {
        serde_json::from_str::<serde_json::Value>(error_text)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_else(|| error_text.trim().to_string())
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Transport(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            RegistryError::Transport(format!("Connection error during {}: {}", context, error))
        } else if error.is_decode() {
            RegistryError::Parse(format!("Invalid response during {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            RegistryError::Transport(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            RegistryError::Transport(format!("{} network error: {}", context, error))
        }
    }
}

/// Validation error utilities
pub struct ValidationErrorHandler;

impl ValidationErrorHandler {
    /// A package file must exist and be a regular file
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(RegistryError::Validation(format!(
                "Input file does not exist: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(RegistryError::Validation(format!(
                "Input path is not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_slug(kind: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(RegistryError::Validation(format!("{} cannot be empty", kind)));
        }

        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(RegistryError::Validation(format!(
                "{} '{}' may only contain letters, digits, '-', '_' and '.'",
                kind, value
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_404_maps_to_not_found() {
        let err = HttpErrorHandler::handle_registry_error(
            StatusCode::NOT_FOUND,
            r#"{"detail": "Not found."}"#,
            "package status",
        );
        match err {
            RegistryError::NotFound(msg) => assert_eq!(msg, "package status: Not found."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_auth_statuses() {
        let err = HttpErrorHandler::handle_registry_error(StatusCode::UNAUTHORIZED, "", "list");
        assert!(matches!(err, RegistryError::Auth(_)));
        let err = HttpErrorHandler::handle_registry_error(StatusCode::FORBIDDEN, "", "list");
        assert!(matches!(err, RegistryError::Auth(_)));
    }

    #[test]
    fn test_other_statuses_keep_code() {
        let err = HttpErrorHandler::handle_registry_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "maintenance",
            "upload",
        );
        match err {
            RegistryError::Http { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("maintenance"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_slug() {
        assert!(ValidationErrorHandler::validate_slug("Repository", "my-repo_1.x").is_ok());
        assert!(ValidationErrorHandler::validate_slug("Repository", "").is_err());
        assert!(ValidationErrorHandler::validate_slug("Repository", "bad/slug").is_err());
    }

    #[test]
    fn test_validate_file_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ValidationErrorHandler::validate_file_path(dir.path()).is_err());
        assert!(ValidationErrorHandler::validate_file_path(&dir.path().join("missing")).is_err());

        let file = dir.path().join("pkg.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(ValidationErrorHandler::validate_file_path(&file).is_ok());
    }
}
