//! In-memory document store for testing

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use docdesk_api_client::{
    BinaryContent, DeleteConfirmation, DocumentStore, ProgressFn, TextContent, UploadFile,
};
use docdesk_core::{Document, DocumentId, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Default)]
struct MockState {
    documents: Vec<Document>,
    texts: HashMap<DocumentId, TextContent>,
    binaries: HashMap<DocumentId, BinaryContent>,
    upload_errors: HashMap<String, StoreError>,
    delete_errors: HashMap<DocumentId, StoreError>,
    next_list_error: Option<StoreError>,
    list_calls: usize,
    fetch_calls: usize,
    delete_calls: usize,
    upload_calls: usize,
}

/// Mock document store.
///
/// Uploads add a document whose id and name are the filename. Fetches of
/// unknown ids and deletes of missing documents fail with `NotFound`.
/// Uploads and fetches can be held back with [`MockStore::hold_uploads`] /
/// [`MockStore::hold_fetches`] until the returned semaphore gets permits.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
    progress_steps: Arc<Vec<u8>>,
    upload_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
    fetch_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress values reported by every upload before it resolves.
    pub fn with_progress_steps(mut self, steps: Vec<u8>) -> Self {
        self.progress_steps = Arc::new(steps);
        self
    }

    pub fn add_document(&self, document: Document) {
        let mut state = self.state.lock().unwrap();
        state.documents.retain(|doc| doc.id != document.id);
        state.documents.push(document);
    }

    pub fn add_text(&self, document: Document, content: TextContent) {
        self.state
            .lock()
            .unwrap()
            .texts
            .insert(document.id.clone(), content);
        self.add_document(document);
    }

    pub fn add_binary(&self, document: Document, bytes: Bytes, content_type: Option<&str>) {
        self.state.lock().unwrap().binaries.insert(
            document.id.clone(),
            BinaryContent {
                bytes,
                content_type: content_type.map(str::to_string),
            },
        );
        self.add_document(document);
    }

    /// Uploads of this filename fail with `error`.
    pub fn fail_upload(&self, filename: &str, error: StoreError) {
        self.state
            .lock()
            .unwrap()
            .upload_errors
            .insert(filename.to_string(), error);
    }

    pub fn fail_delete(&self, id: &str, error: StoreError) {
        self.state
            .lock()
            .unwrap()
            .delete_errors
            .insert(DocumentId::from(id), error);
    }

    /// The next list call fails with `error`; later calls succeed.
    pub fn fail_next_list(&self, error: StoreError) {
        self.state.lock().unwrap().next_list_error = Some(error);
    }

    pub fn hold_uploads(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.upload_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn hold_fetches(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    pub fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().upload_calls
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }

    fn not_found(id: &DocumentId) -> StoreError {
        StoreError::NotFound(format!("File not found: {}", id))
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn list_documents(&self) -> StoreResult<Vec<Document>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        match state.next_list_error.take() {
            Some(err) => Err(err),
            None => Ok(state.documents.clone()),
        }
    }

    async fn fetch_document_text(&self, id: &DocumentId) -> StoreResult<TextContent> {
        Self::pass(&self.fetch_gate).await;
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        state
            .texts
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn fetch_document_bytes(&self, id: &DocumentId) -> StoreResult<BinaryContent> {
        Self::pass(&self.fetch_gate).await;
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        state
            .binaries
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn delete_document(&self, id: &DocumentId) -> StoreResult<DeleteConfirmation> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        if let Some(err) = state.delete_errors.get(id) {
            return Err(err.clone());
        }

        let before = state.documents.len();
        state.documents.retain(|doc| &doc.id != id);
        if state.documents.len() == before {
            return Err(Self::not_found(id));
        }
        state.texts.remove(id);
        state.binaries.remove(id);

        Ok(DeleteConfirmation {
            message: Some(format!("Successfully deleted file '{}'", id)),
            deleted_chunks: Some(1),
        })
    }

    async fn upload_document(
        &self,
        file: UploadFile,
        on_progress: ProgressFn,
    ) -> StoreResult<Document> {
        self.state.lock().unwrap().upload_calls += 1;
        Self::pass(&self.upload_gate).await;

        for step in self.progress_steps.iter() {
            on_progress(*step);
            tokio::task::yield_now().await;
        }

        let failure = self
            .state
            .lock()
            .unwrap()
            .upload_errors
            .get(&file.filename)
            .cloned();
        if let Some(err) = failure {
            return Err(err);
        }

        let document = Document {
            id: DocumentId::from(file.filename.as_str()),
            name: file.filename.clone(),
            uploaded_at: Some(Utc::now()),
            size_bytes: Some(file.size()),
            content_type: None,
        };
        self.add_text(
            document.clone(),
            TextContent {
                content: Some(String::from_utf8_lossy(&file.data).into_owned()),
                text: None,
            },
        );
        Ok(document)
    }
}
