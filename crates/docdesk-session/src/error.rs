//! Errors raised by the session containers.
//!
//! Store failures pass through unchanged as [`StoreError`]; the variants here
//! cover misuse of the local state (unknown ids, forbidden transitions) and
//! object URL backends.

use docdesk_core::{DocumentId, ErrorMetadata, LogLevel, StoreError};

use crate::upload_queue::JobId;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Unknown upload job: {0}")]
    UnknownJob(JobId),

    /// Pending and uploading jobs cannot be removed; uploads are not cancellable.
    #[error("Upload job {0} is still in flight")]
    InFlight(JobId),
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("Document {0} is not in the catalog")]
    UnknownDocument(DocumentId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ErrorMetadata for DeskError {
    fn error_code(&self) -> &'static str {
        match self {
            DeskError::UnknownDocument(_) => "UNKNOWN_DOCUMENT",
            DeskError::Store(err) => err.error_code(),
            DeskError::Queue(QueueError::UnknownJob(_)) => "UNKNOWN_JOB",
            DeskError::Queue(QueueError::InFlight(_)) => "JOB_IN_FLIGHT",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            DeskError::Store(err) => err.is_recoverable(),
            DeskError::Queue(QueueError::InFlight(_)) => true,
            _ => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            DeskError::UnknownDocument(_) => Some("Refresh the document list"),
            DeskError::Store(err) => err.suggested_action(),
            DeskError::Queue(QueueError::InFlight(_)) => {
                Some("Wait for the upload to finish before removing it")
            }
            DeskError::Queue(QueueError::UnknownJob(_)) => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            DeskError::Store(err) => err.client_message(),
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            DeskError::Store(err) => err.log_level(),
            _ => LogLevel::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_their_metadata() {
        let err = DeskError::from(StoreError::Transport("timed out".to_string()));
        assert_eq!(err.error_code(), "TRANSPORT_ERROR");
        assert_eq!(err.client_message(), "Document service unavailable");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_local_errors() {
        let err = DeskError::UnknownDocument(DocumentId::from("ghost.pdf"));
        assert_eq!(err.error_code(), "UNKNOWN_DOCUMENT");
        assert_eq!(err.client_message(), "Document ghost.pdf is not in the catalog");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }
}
