//! Constants shared across docdesk crates.

/// Shown by the viewer when a text response carries neither `content` nor `text`.
pub const NO_CONTENT_PLACEHOLDER: &str = "No content available";

/// Shown by the viewer when fetching a document's content fails on either path.
pub const CONTENT_LOAD_ERROR: &str = "Error loading document content";

/// Job error used when an upload failure carries no usable text.
pub const UPLOAD_FAILED: &str = "Upload failed";

/// Display name for a document that has neither a name nor a filename.
pub const UNTITLED: &str = "Untitled";

/// Display date for a document without an upload timestamp.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Delay between a job reaching `completed` and its removal from the queue.
pub const DEFAULT_EVICT_DELAY_MS: u64 = 3_000;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const DEFAULT_API_PREFIX: &str = "/api";

/// Extensions offered by the file picker. Advisory only: the server decides.
pub const ACCEPTED_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "txt", "docx", "doc", "md"];

/// Extensions loaded through the binary (object URL) path.
pub const BINARY_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "gif", "svg", "webp"];

pub const OCTET_STREAM: &str = "application/octet-stream";
