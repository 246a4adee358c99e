//! Error types module
//!
//! Every failure of the document store surfaces as a [`StoreError`]. The
//! variants follow the three failure classes the UI distinguishes:
//! rejected input, a target that no longer exists, and an unavailable
//! service. None of them is retried automatically; callers turn them into a
//! terminal UI state using the [`ErrorMetadata`] description.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for missing targets the user can recover from
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the operation by hand may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The server rejected the input (e.g. an unsupported file type).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The target document no longer exists.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure or server unavailability.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Transport(format!("Invalid response body: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn store_error_static_metadata(
    err: &StoreError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        StoreError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Check the file type and try a different file"),
            LogLevel::Debug,
        ),
        StoreError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Refresh the document list"),
            LogLevel::Warn,
        ),
        StoreError::Transport(_) => (
            "TRANSPORT_ERROR",
            true,
            Some("Check that the document service is reachable and try again"),
            LogLevel::Error,
        ),
    }
}

impl StoreError {
    /// Server-provided text carried by the failure, if any.
    ///
    /// Transport failures never carry user-facing text; their message is
    /// diagnostic only.
    pub fn detail(&self) -> Option<&str> {
        match self {
            StoreError::Validation(msg) | StoreError::NotFound(msg) => {
                let trimmed = msg.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            StoreError::Transport(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl ErrorMetadata for StoreError {
    fn error_code(&self) -> &'static str {
        store_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        store_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        store_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        store_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            StoreError::Validation(_) => self
                .detail()
                .unwrap_or("The document service rejected the request")
                .to_string(),
            StoreError::NotFound(_) => self
                .detail()
                .unwrap_or("Document not found")
                .to_string(),
            StoreError::Transport(_) => "Document service unavailable".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_validation() {
        let err = StoreError::Validation("Unsupported file type: .exe".to_string());
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Unsupported file type: .exe");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = StoreError::NotFound(String::new());
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.client_message(), "Document not found");
        assert_eq!(err.suggested_action(), Some("Refresh the document list"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_transport_message_is_generic() {
        let err = StoreError::Transport("connection refused (os error 111)".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Document service unavailable");
        assert_eq!(err.detail(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_blank_detail_counts_as_absent() {
        assert_eq!(StoreError::Validation("   ".to_string()).detail(), None);
        assert_eq!(
            StoreError::Validation(" too large ".to_string()).detail(),
            Some("too large")
        );
    }
}
