//! Document Viewer State Machine
//!
//! At most one [`ViewerSession`] is active. Opening a document picks the
//! binary or text path from its extension, starts the fetch on a task and
//! enters `loading`. The result comes back as a [`DeskEvent::ContentLoaded`]
//! tagged with the session's [`SessionTicket`]; results for a superseded
//! ticket are dropped.
//!
//! A binary session owns its [`ObjectUrl`]. Closing or replacing the session
//! drops the guard, which releases the URL.

use docdesk_api_client::{BinaryContent, DocumentStore, TextContent};
use docdesk_core::constants::{CONTENT_LOAD_ERROR, NO_CONTENT_PLACEHOLDER, OCTET_STREAM};
use docdesk_core::models::{content_type_for_extension, extension_of};
use docdesk_core::{BinaryRenderer, Document, DocumentClass, DocumentId, StoreResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::events::{DeskEvent, EventSender};
use crate::resource::{ObjectUrl, ObjectUrlFactory};

/// Identifies one opening of the viewer. Every `open` issues a new ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    Idle,
    Loading,
    ReadyBinary,
    ReadyText,
    Error,
}

/// Fetched document content, by path.
#[derive(Debug)]
pub enum LoadedContent {
    Binary(BinaryContent),
    Text(TextContent),
}

#[derive(Debug)]
enum SessionState {
    Loading,
    ReadyBinary {
        url: ObjectUrl,
        renderer: BinaryRenderer,
        content_type: String,
    },
    ReadyText(String),
    Error(String),
}

#[derive(Debug)]
pub struct ViewerSession {
    ticket: SessionTicket,
    document_id: DocumentId,
    class: DocumentClass,
    /// Media type from the catalog entry or the extension, used when the
    /// fetch response declares none.
    type_hint: Option<String>,
    state: SessionState,
}

impl ViewerSession {
    pub fn ticket(&self) -> SessionTicket {
        self.ticket
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn class(&self) -> DocumentClass {
        self.class
    }

    pub fn phase(&self) -> ViewerPhase {
        match self.state {
            SessionState::Loading => ViewerPhase::Loading,
            SessionState::ReadyBinary { .. } => ViewerPhase::ReadyBinary,
            SessionState::ReadyText(_) => ViewerPhase::ReadyText,
            SessionState::Error(_) => ViewerPhase::Error,
        }
    }

    pub fn object_url(&self) -> Option<&str> {
        match &self.state {
            SessionState::ReadyBinary { url, .. } => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn renderer(&self) -> Option<BinaryRenderer> {
        match &self.state {
            SessionState::ReadyBinary { renderer, .. } => Some(*renderer),
            _ => None,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match &self.state {
            SessionState::ReadyBinary { content_type, .. } => Some(content_type),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.state {
            SessionState::ReadyText(text) => Some(text),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error(message) => Some(message),
            _ => None,
        }
    }
}

pub struct Viewer {
    store: Arc<dyn DocumentStore>,
    urls: Arc<dyn ObjectUrlFactory>,
    events: EventSender,
    session: Option<ViewerSession>,
    next_ticket: u64,
}

impl Viewer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        urls: Arc<dyn ObjectUrlFactory>,
        events: EventSender,
    ) -> Self {
        Self {
            store,
            urls,
            events,
            session: None,
            next_ticket: 0,
        }
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> ViewerPhase {
        self.session
            .as_ref()
            .map_or(ViewerPhase::Idle, ViewerSession::phase)
    }

    /// Open a document, replacing (and releasing) any current session.
    pub fn open(&mut self, document: &Document) -> SessionTicket {
        self.close();

        let ticket = SessionTicket(self.next_ticket);
        self.next_ticket += 1;

        let class = DocumentClass::for_name(&document.name);
        let type_hint = document
            .content_type
            .clone()
            .filter(|ct| !ct.trim().is_empty() && ct.as_str() != OCTET_STREAM)
            .or_else(|| {
                extension_of(&document.name)
                    .and_then(|ext| content_type_for_extension(&ext))
                    .map(str::to_string)
            });

        info!(document_id = %document.id, ?class, "Opening document");
        self.session = Some(ViewerSession {
            ticket,
            document_id: document.id.clone(),
            class,
            type_hint,
            state: SessionState::Loading,
        });

        self.spawn_fetch(ticket, document.id.clone(), class);
        ticket
    }

    fn spawn_fetch(&self, ticket: SessionTicket, id: DocumentId, class: DocumentClass) {
        let store = self.store.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match class {
                DocumentClass::Binary(_) => store
                    .fetch_document_bytes(&id)
                    .await
                    .map(LoadedContent::Binary),
                DocumentClass::Text => store
                    .fetch_document_text(&id)
                    .await
                    .map(LoadedContent::Text),
            };
            if events
                .send(DeskEvent::ContentLoaded { ticket, outcome })
                .is_err()
            {
                debug!(document_id = %id, "Event channel closed before content loaded");
            }
        });
    }

    /// Apply a fetch result. Returns false when the result belongs to a
    /// session that is no longer current, or the session already settled.
    pub fn apply_loaded(
        &mut self,
        ticket: SessionTicket,
        outcome: StoreResult<LoadedContent>,
    ) -> bool {
        let urls = self.urls.clone();
        let Some(session) = self.session.as_mut().filter(|s| s.ticket == ticket) else {
            debug!(?ticket, "Discarding content for a superseded viewer session");
            return false;
        };
        if !matches!(session.state, SessionState::Loading) {
            debug!(?ticket, "Discarding duplicate content for viewer session");
            return false;
        }

        session.state = match (session.class, outcome) {
            (DocumentClass::Binary(renderer), Ok(LoadedContent::Binary(content))) => {
                let content_type = content
                    .content_type
                    .filter(|ct| !ct.trim().is_empty() && ct.as_str() != OCTET_STREAM)
                    .or_else(|| session.type_hint.clone())
                    .unwrap_or_else(|| OCTET_STREAM.to_string());

                match ObjectUrl::create(urls, &content.bytes, &content_type) {
                    Ok(url) => SessionState::ReadyBinary {
                        url,
                        renderer,
                        content_type,
                    },
                    Err(e) => {
                        warn!(document_id = %session.document_id, error = %e, "Failed to create object URL");
                        SessionState::Error(CONTENT_LOAD_ERROR.to_string())
                    }
                }
            }
            (DocumentClass::Text, Ok(LoadedContent::Text(content))) => SessionState::ReadyText(
                content
                    .into_text()
                    .unwrap_or_else(|| NO_CONTENT_PLACEHOLDER.to_string()),
            ),
            (_, Ok(_)) => {
                warn!(document_id = %session.document_id, "Content does not match document class");
                SessionState::Error(CONTENT_LOAD_ERROR.to_string())
            }
            (_, Err(e)) => {
                warn!(document_id = %session.document_id, error = %e, "Failed to load document content");
                SessionState::Error(CONTENT_LOAD_ERROR.to_string())
            }
        };
        true
    }

    /// Close the session, releasing its object URL. Returns false when
    /// nothing was open.
    pub fn close(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                debug!(document_id = %session.document_id, "Closing viewer");
                drop(session);
                true
            }
            None => false,
        }
    }

    /// Close the session if it shows the given document.
    pub fn close_if_viewing(&mut self, id: &DocumentId) -> bool {
        if self.viewing(id) {
            self.close()
        } else {
            false
        }
    }

    pub fn viewing(&self, id: &DocumentId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| &session.document_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{self, EventReceiver};
    use crate::resource::MemoryObjectUrls;
    use crate::test_helpers::MockStore;
    use bytes::Bytes;
    use docdesk_core::StoreError;

    struct Fixture {
        viewer: Viewer,
        rx: EventReceiver,
        urls: Arc<MemoryObjectUrls>,
    }

    fn fixture(store: MockStore) -> Fixture {
        let (tx, rx) = events::channel();
        let urls = Arc::new(MemoryObjectUrls::new());
        let viewer = Viewer::new(Arc::new(store), urls.clone(), tx);
        Fixture { viewer, rx, urls }
    }

    impl Fixture {
        async fn settle(&mut self) -> bool {
            match self.rx.recv().await {
                Some(DeskEvent::ContentLoaded { ticket, outcome }) => {
                    self.viewer.apply_loaded(ticket, outcome)
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    fn pdf(id: &str) -> Document {
        Document::new(id, id)
    }

    #[tokio::test]
    async fn test_binary_document_reaches_ready_binary() {
        let store = MockStore::new();
        store.add_binary(pdf("report.pdf"), Bytes::from_static(b"%PDF"), None);
        let mut f = fixture(store);

        f.viewer.open(&pdf("report.pdf"));
        assert_eq!(f.viewer.phase(), ViewerPhase::Loading);
        assert!(f.settle().await);

        let session = f.viewer.session().unwrap();
        assert_eq!(session.phase(), ViewerPhase::ReadyBinary);
        assert_eq!(session.renderer(), Some(BinaryRenderer::EmbeddedFrame));
        assert_eq!(session.content_type(), Some("application/pdf"));
        assert!(f.urls.is_live(session.object_url().unwrap()));
    }

    #[tokio::test]
    async fn test_image_keeps_declared_content_type() {
        let store = MockStore::new();
        let photo = Document::new("IMG_01.JPG", "IMG_01.JPG");
        store.add_binary(photo.clone(), Bytes::from_static(b"\xff\xd8"), Some("image/jpeg"));
        let mut f = fixture(store);

        f.viewer.open(&photo);
        f.settle().await;
        let session = f.viewer.session().unwrap();
        assert_eq!(session.renderer(), Some(BinaryRenderer::Image));
        assert_eq!(session.content_type(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_empty_text_is_content_not_placeholder() {
        let store = MockStore::new();
        let notes = Document::new("notes.txt", "notes.txt");
        store.add_text(
            notes.clone(),
            TextContent {
                content: None,
                text: Some(String::new()),
            },
        );
        let mut f = fixture(store);

        f.viewer.open(&notes);
        f.settle().await;
        assert_eq!(f.viewer.phase(), ViewerPhase::ReadyText);
        assert_eq!(f.viewer.session().unwrap().text(), Some(""));
    }

    #[tokio::test]
    async fn test_missing_text_fields_use_placeholder() {
        let store = MockStore::new();
        let doc = Document::new("letter.docx", "letter.docx");
        store.add_text(doc.clone(), TextContent::default());
        let mut f = fixture(store);

        f.viewer.open(&doc);
        f.settle().await;
        let session = f.viewer.session().unwrap();
        assert_eq!(session.class(), DocumentClass::Text);
        assert_eq!(session.phase(), ViewerPhase::ReadyText);
        assert_eq!(session.text(), Some("No content available"));
    }

    #[tokio::test]
    async fn test_fetch_failure_enters_error_and_stays_open() {
        let mut f = fixture(MockStore::new());
        let gone = Document::new("gone.md", "gone.md");

        f.viewer.open(&gone);
        f.settle().await;
        let session = f.viewer.session().unwrap();
        assert_eq!(session.phase(), ViewerPhase::Error);
        assert_eq!(session.error(), Some("Error loading document content"));

        assert!(f.viewer.close());
        assert_eq!(f.viewer.phase(), ViewerPhase::Idle);
    }

    #[tokio::test]
    async fn test_binary_fetch_failure_creates_no_url() {
        let store = MockStore::new();
        let mut f = fixture(store.clone());

        f.viewer.open(&pdf("x.pdf"));
        assert_eq!(
            f.viewer.session().unwrap().class(),
            DocumentClass::Binary(BinaryRenderer::EmbeddedFrame)
        );
        f.settle().await;

        let session = f.viewer.session().unwrap();
        assert_eq!(session.phase(), ViewerPhase::Error);
        assert_eq!(session.error(), Some("Error loading document content"));
        assert_eq!(session.object_url(), None);
        assert_eq!(store.fetch_calls(), 1);
        assert_eq!(f.urls.created_count(), 0);
    }

    #[tokio::test]
    async fn test_opening_another_document_releases_previous_url() {
        let store = MockStore::new();
        store.add_binary(pdf("a.pdf"), Bytes::from_static(b"A"), None);
        store.add_binary(pdf("b.png"), Bytes::from_static(b"B"), None);
        let mut f = fixture(store);

        f.viewer.open(&pdf("a.pdf"));
        f.settle().await;
        let first_url = f.viewer.session().unwrap().object_url().unwrap().to_string();

        f.viewer.open(&pdf("b.png"));
        f.settle().await;

        assert_eq!(f.urls.created_count(), 2);
        assert_eq!(f.urls.revoked_count(), 1);
        assert_eq!(f.urls.live_count(), 1);
        assert!(!f.urls.is_live(&first_url));
        assert_eq!(f.viewer.session().unwrap().content_type(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_close_with_nothing_open_is_noop() {
        let mut f = fixture(MockStore::new());
        assert!(!f.viewer.close());
        assert_eq!(f.viewer.phase(), ViewerPhase::Idle);
        assert_eq!(f.urls.revoked_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded() {
        let store = MockStore::new();
        store.add_binary(pdf("a.pdf"), Bytes::from_static(b"A"), None);
        store.add_text(
            Document::new("b.txt", "b.txt"),
            TextContent {
                content: Some("current".to_string()),
                text: None,
            },
        );
        let gate = store.hold_fetches();
        let mut f = fixture(store);

        let first = f.viewer.open(&pdf("a.pdf"));
        let second = f.viewer.open(&Document::new("b.txt", "b.txt"));
        assert_ne!(first, second);
        gate.add_permits(2);

        let applied = [f.settle().await, f.settle().await];
        assert_eq!(applied.iter().filter(|a| **a).count(), 1);

        let session = f.viewer.session().unwrap();
        assert_eq!(session.ticket(), second);
        assert_eq!(session.text(), Some("current"));
        assert_eq!(f.urls.created_count(), 0);
    }

    #[tokio::test]
    async fn test_late_result_after_close_is_discarded() {
        let store = MockStore::new();
        store.add_binary(pdf("a.pdf"), Bytes::from_static(b"A"), None);
        let mut f = fixture(store);

        f.viewer.open(&pdf("a.pdf"));
        f.viewer.close();
        assert!(!f.settle().await);
        assert_eq!(f.urls.created_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_viewer_releases_url() {
        let store = MockStore::new();
        store.add_binary(pdf("a.pdf"), Bytes::from_static(b"A"), None);
        let mut f = fixture(store);

        f.viewer.open(&pdf("a.pdf"));
        f.settle().await;
        assert_eq!(f.urls.live_count(), 1);

        let Fixture { viewer, urls, .. } = f;
        drop(viewer);
        assert_eq!(urls.live_count(), 0);
        assert_eq!(urls.revoked_count(), 1);
    }

    #[tokio::test]
    async fn test_mismatched_content_is_an_error() {
        let mut f = fixture(MockStore::new());
        let ticket = f.viewer.open(&pdf("a.pdf"));
        assert!(f
            .viewer
            .apply_loaded(ticket, Ok(LoadedContent::Text(TextContent::default()))));
        assert_eq!(f.viewer.phase(), ViewerPhase::Error);
        assert!(!f
            .viewer
            .apply_loaded(ticket, Err(StoreError::NotFound(String::new()))));
    }
}
