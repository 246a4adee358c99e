//! Document Catalog
//!
//! The only owner of the authoritative document list. Readers get an
//! immutable snapshot (`Arc<Vec<Document>>`) taken at read time; the list is
//! replaced wholesale on refresh and rebuilt on removal, never edited in
//! place under a reader.

use docdesk_api_client::{DeleteConfirmation, DocumentStore};
use docdesk_core::{Document, DocumentId, StoreResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    documents: Arc<Vec<Document>>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            documents: Arc::new(Vec::new()),
        }
    }

    /// Re-fetch the list from the store. On failure the current list is
    /// kept and the error returned for reporting.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> StoreResult<Arc<Vec<Document>>> {
        match self.store.list_documents().await {
            Ok(documents) => {
                info!(count = documents.len(), "Document list refreshed");
                self.documents = Arc::new(documents);
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!(error = %e, kept = self.documents.len(), "Document list refresh failed");
                Err(e)
            }
        }
    }

    /// Delete a document on the server, then drop it locally. Local state is
    /// untouched unless the server confirms.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn remove(&mut self, id: &DocumentId) -> StoreResult<DeleteConfirmation> {
        let confirmation = self.store.delete_document(id).await?;

        let remaining: Vec<Document> = self
            .documents
            .iter()
            .filter(|doc| &doc.id != id)
            .cloned()
            .collect();
        self.documents = Arc::new(remaining);

        info!(deleted_chunks = ?confirmation.deleted_chunks, "Document deleted");
        Ok(confirmation)
    }

    pub fn snapshot(&self) -> Arc<Vec<Document>> {
        self.documents.clone()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| &doc.id == id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
