//! Domain methods for the document service client.
//!
//! Routes: `GET /files`, `GET /files/{id}`, `DELETE /files/{id}`,
//! `POST /files/upload` (multipart field `file`) and `POST /chat`.

use async_trait::async_trait;
use docdesk_core::constants::OCTET_STREAM;
use docdesk_core::models::{content_type_for_extension, extension_of};
use docdesk_core::{Document, DocumentDescriptor, DocumentId, StoreError, StoreResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::progress::progress_body;
use crate::store::{
    BinaryContent, DeleteConfirmation, DocumentStore, ProgressFn, TextContent, UploadFile,
};
use crate::{encode_id, transport_error, ApiClient};

/// Chat request: the prompt plus the ordered selection it is grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub document_ids: Vec<DocumentId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

impl ApiClient {
    fn file_path(id: &DocumentId) -> String {
        format!("/files/{}", encode_id(id.as_str()))
    }

    /// Ask the chat endpoint a question grounded on the selected documents.
    #[instrument(skip(self, prompt), fields(documents = document_ids.len()))]
    pub async fn send_chat(
        &self,
        prompt: &str,
        document_ids: &[DocumentId],
    ) -> StoreResult<ChatResponse> {
        let request = ChatRequest {
            prompt: prompt.to_string(),
            document_ids: document_ids.to_vec(),
        };
        self.post_json("/chat", &request).await
    }
}

#[async_trait]
impl DocumentStore for ApiClient {
    #[instrument(skip(self))]
    async fn list_documents(&self) -> StoreResult<Vec<Document>> {
        let descriptors: Vec<DocumentDescriptor> = self.get("/files").await?;
        let total = descriptors.len();
        let documents: Vec<Document> = descriptors
            .into_iter()
            .filter_map(DocumentDescriptor::into_document)
            .collect();

        if documents.len() < total {
            debug!(
                skipped = total - documents.len(),
                "Ignored list entries without an identity"
            );
        }
        Ok(documents)
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn fetch_document_text(&self, id: &DocumentId) -> StoreResult<TextContent> {
        let request = self.client().get(self.build_url(&Self::file_path(id)));
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(transport_error)?;

        // Files the server cannot decode as text come back as raw bytes.
        match serde_json::from_slice(&body) {
            Ok(content) => Ok(content),
            Err(e) => {
                debug!(
                    error = %e,
                    len = body.len(),
                    "Text response is not JSON, no content to show"
                );
                Ok(TextContent::default())
            }
        }
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn fetch_document_bytes(&self, id: &DocumentId) -> StoreResult<BinaryContent> {
        let request = self.client().get(self.build_url(&Self::file_path(id)));
        let response = self.send(request).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response.bytes().await.map_err(transport_error)?;

        Ok(BinaryContent {
            bytes,
            content_type,
        })
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn delete_document(&self, id: &DocumentId) -> StoreResult<DeleteConfirmation> {
        let body = self.delete(&Self::file_path(id)).await?;
        match serde_json::from_slice(&body) {
            Ok(confirmation) => Ok(confirmation),
            Err(e) => {
                debug!(error = %e, len = body.len(), "Ignored unreadable delete confirmation");
                Ok(DeleteConfirmation::default())
            }
        }
    }

    #[instrument(skip(self, file, on_progress), fields(filename = %file.filename, size = file.size()))]
    async fn upload_document(
        &self,
        file: UploadFile,
        on_progress: ProgressFn,
    ) -> StoreResult<Document> {
        let size = file.size();
        let mime = extension_of(&file.filename)
            .and_then(|ext| content_type_for_extension(&ext))
            .unwrap_or(OCTET_STREAM);

        let part = Part::stream_with_length(progress_body(file.data.clone(), on_progress), size)
            .file_name(file.filename.clone())
            .mime_str(mime)
            .map_err(|e| StoreError::Transport(format!("Invalid upload part: {}", e)))?;
        let form = Form::new().part("file", part);

        let receipt: DocumentDescriptor = self.post_multipart("/files/upload", form).await?;
        Ok(receipt.into_uploaded_document(&file.filename, size))
    }
}
