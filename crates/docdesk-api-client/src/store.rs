//! Document store abstraction
//!
//! Every state component talks to the document service through
//! [`DocumentStore`], so tests can substitute an in-memory implementation.
//! Each method is a single attempt: failures are returned unchanged and
//! never retried.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use docdesk_core::{Document, DocumentId, StoreResult};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Upload progress callback, called with a non-decreasing percentage 0-100.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Body of a text document.
///
/// The service answers with `content`; older deployments used `text`. Either
/// field may be missing. An empty string is still content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TextContent {
    pub fn into_text(self) -> Option<String> {
        self.content.or(self.text)
    }
}

/// Raw payload of a binary document with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryContent {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Server acknowledgement of a deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteConfirmation {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub deleted_chunks: Option<u64>,
}

/// A local file accepted for upload: opaque payload plus its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Not a file path: {}", path.display()))?
            .to_string();

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self::new(filename, data))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self) -> StoreResult<Vec<Document>>;

    async fn fetch_document_text(&self, id: &DocumentId) -> StoreResult<TextContent>;

    async fn fetch_document_bytes(&self, id: &DocumentId) -> StoreResult<BinaryContent>;

    async fn delete_document(&self, id: &DocumentId) -> StoreResult<DeleteConfirmation>;

    async fn upload_document(
        &self,
        file: UploadFile,
        on_progress: ProgressFn,
    ) -> StoreResult<Document>;
}
