//! The desk: owner of the four state containers.
//!
//! `Desk` holds the upload queue, catalog, selection and viewer along with
//! the receiving end of the event channel. Calling [`Desk::process_next`] in
//! a loop plays the role of the UI event loop: one event is applied at a
//! time, and the cross-component reactions (refresh the catalog after an
//! upload, reconcile the selection and close the viewer after a delete)
//! happen here rather than inside the components.

use docdesk_api_client::{DeleteConfirmation, DocumentStore, UploadFile};
use docdesk_core::{ClientConfig, Document, DocumentId, ErrorMetadata, StoreResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::DeskError;
use crate::events::{self, DeskEvent, EventReceiver, Notice};
use crate::resource::ObjectUrlFactory;
use crate::selection::Selection;
use crate::upload_queue::{JobId, UploadJob, UploadQueue};
use crate::viewer::{SessionTicket, Viewer};

const NOTICE_CAPACITY: usize = 64;

pub struct Desk {
    uploads: UploadQueue,
    catalog: Catalog,
    selection: Selection,
    viewer: Viewer,
    events_rx: EventReceiver,
    notices: broadcast::Sender<Notice>,
}

impl Desk {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        urls: Arc<dyn ObjectUrlFactory>,
        evict_delay: Duration,
    ) -> Self {
        let (events_tx, events_rx) = events::channel();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            uploads: UploadQueue::new(store.clone(), events_tx.clone(), evict_delay),
            catalog: Catalog::new(store.clone()),
            selection: Selection::new(),
            viewer: Viewer::new(store, urls, events_tx),
            events_rx,
            notices,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        store: Arc<dyn DocumentStore>,
        urls: Arc<dyn ObjectUrlFactory>,
    ) -> Self {
        Self::new(store, urls, config.evict_delay)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    pub fn uploads(&self) -> &UploadQueue {
        &self.uploads
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Re-fetch the document list and drop selections that no longer exist.
    pub async fn refresh(&mut self) -> StoreResult<Arc<Vec<Document>>> {
        match self.catalog.refresh().await {
            Ok(snapshot) => {
                self.notify(Notice::CatalogChanged);
                if self.selection.reconcile(&snapshot) > 0 {
                    self.notify(Notice::SelectionChanged);
                }
                Ok(snapshot)
            }
            Err(e) => {
                self.notify(Notice::CatalogRefreshFailed(e.client_message()));
                Err(e)
            }
        }
    }

    pub fn upload(&mut self, files: Vec<UploadFile>) -> Vec<JobId> {
        let ids = self.uploads.enqueue(files);
        if !ids.is_empty() {
            self.notify(Notice::JobsChanged);
        }
        ids
    }

    /// Remove a completed or failed job from the queue.
    pub fn dismiss_job(&mut self, id: &JobId) -> Result<UploadJob, DeskError> {
        let job = self.uploads.remove(id)?;
        self.notify(Notice::JobsChanged);
        Ok(job)
    }

    /// Toggle a catalog document in the chat selection. Returns whether it
    /// is selected afterwards.
    pub fn toggle_selection(&mut self, id: &DocumentId) -> Result<bool, DeskError> {
        let document = self
            .catalog
            .get(id)
            .ok_or_else(|| DeskError::UnknownDocument(id.clone()))?;
        let selected = self.selection.toggle(document);
        self.notify(Notice::SelectionChanged);
        Ok(selected)
    }

    /// Ordered ids of the selected documents, for the chat request.
    pub fn chat_document_ids(&self) -> Vec<DocumentId> {
        self.selection.document_ids().to_vec()
    }

    pub fn open(&mut self, id: &DocumentId) -> Result<SessionTicket, DeskError> {
        let document = self
            .catalog
            .get(id)
            .ok_or_else(|| DeskError::UnknownDocument(id.clone()))?;
        let ticket = self.viewer.open(document);
        self.notify(Notice::ViewerChanged);
        Ok(ticket)
    }

    pub fn close_viewer(&mut self) -> bool {
        let closed = self.viewer.close();
        if closed {
            self.notify(Notice::ViewerChanged);
        }
        closed
    }

    /// Delete a document. On success it leaves the catalog and the
    /// selection, and the viewer closes if it was showing it.
    pub async fn delete(&mut self, id: &DocumentId) -> Result<DeleteConfirmation, DeskError> {
        let confirmation = self.catalog.remove(id).await?;
        self.notify(Notice::CatalogChanged);

        if self.selection.reconcile(&self.catalog.snapshot()) > 0 {
            self.notify(Notice::SelectionChanged);
        }
        if self.viewer.close_if_viewing(id) {
            self.notify(Notice::ViewerChanged);
        }
        Ok(confirmation)
    }

    /// Wait for the next event from a spawned task.
    pub async fn next_event(&mut self) -> Option<DeskEvent> {
        self.events_rx.recv().await
    }

    pub async fn dispatch(&mut self, event: DeskEvent) {
        match event {
            DeskEvent::UploadProgress { job_id, percent } => {
                if self.uploads.apply_progress(&job_id, percent) {
                    self.notify(Notice::JobsChanged);
                }
            }
            DeskEvent::UploadFinished { job_id, outcome } => {
                let created = self.uploads.apply_finished(&job_id, outcome);
                self.notify(Notice::JobsChanged);

                if let Some(document) = created {
                    self.notify(Notice::UploadCompleted(document));
                    if let Err(e) = self.refresh().await {
                        warn!(job_id = %job_id, error = %e, "Catalog refresh after upload failed");
                    }
                }
            }
            DeskEvent::EvictJob { job_id } => {
                if self.uploads.evict(&job_id) {
                    self.notify(Notice::JobsChanged);
                }
            }
            DeskEvent::ContentLoaded { ticket, outcome } => {
                if self.viewer.apply_loaded(ticket, outcome) {
                    self.notify(Notice::ViewerChanged);
                }
            }
        }
    }

    /// Apply the next event. Returns false once every sender is gone.
    pub async fn process_next(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                debug!(?event, "Dispatching desk event");
                self.dispatch(event).await;
                true
            }
            None => {
                info!("Desk event channel closed");
                false
            }
        }
    }
}
