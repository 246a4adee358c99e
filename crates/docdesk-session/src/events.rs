//! Event channel between spawned I/O tasks and the [`Desk`](crate::Desk).
//!
//! Tasks never touch state directly. They send a [`DeskEvent`] and the desk
//! applies it, so all mutation happens on one consumer in arrival order.

use docdesk_core::{Document, StoreResult};
use tokio::sync::mpsc;

use crate::upload_queue::JobId;
use crate::viewer::{LoadedContent, SessionTicket};

#[derive(Debug)]
pub enum DeskEvent {
    UploadProgress {
        job_id: JobId,
        percent: u8,
    },
    UploadFinished {
        job_id: JobId,
        outcome: StoreResult<Document>,
    },
    /// Fired once the eviction delay after completion has elapsed.
    EvictJob {
        job_id: JobId,
    },
    ContentLoaded {
        ticket: SessionTicket,
        outcome: StoreResult<LoadedContent>,
    },
}

pub type EventSender = mpsc::UnboundedSender<DeskEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DeskEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Coarse change notifications for UI observers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    JobsChanged,
    UploadCompleted(Document),
    CatalogChanged,
    /// Refresh failed; the previous list is still shown. Carries the
    /// user-facing message.
    CatalogRefreshFailed(String),
    SelectionChanged,
    ViewerChanged,
}
