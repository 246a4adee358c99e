//! Client-side state manager for docdesk.
//!
//! Four owned state containers, each mutated only through its own
//! operations:
//!
//! - [`UploadQueue`]: concurrent upload jobs and their lifecycle
//! - [`Catalog`]: the authoritative document list
//! - [`Selection`]: documents picked as chat context
//! - [`Viewer`]: the single document preview session and its object URL
//!
//! Network work runs on spawned tasks that report back through a
//! [`DeskEvent`] channel. [`Desk`] owns the containers and the receiving end,
//! applies events one at a time and publishes [`Notice`]s to observers.

pub mod catalog;
pub mod desk;
pub mod error;
pub mod events;
pub mod resource;
pub mod selection;
pub mod upload_queue;
pub mod viewer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use catalog::Catalog;
pub use desk::Desk;
pub use error::{DeskError, QueueError, ResourceError};
pub use events::{DeskEvent, EventReceiver, EventSender, Notice};
pub use resource::{MemoryObjectUrls, ObjectUrl, ObjectUrlFactory, TempFileObjectUrls};
pub use selection::Selection;
pub use upload_queue::{JobId, JobStatus, UploadJob, UploadQueue};
pub use viewer::{LoadedContent, SessionTicket, Viewer, ViewerPhase, ViewerSession};
