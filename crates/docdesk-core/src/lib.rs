//! Docdesk Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! display helpers shared by the API client, the session state manager and
//! the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod models;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ErrorMetadata, LogLevel, StoreError, StoreResult};
pub use format::{format_file_size, truncate_string};
pub use models::{BinaryRenderer, Document, DocumentClass, DocumentDescriptor, DocumentId};
