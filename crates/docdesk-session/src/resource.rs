//! Transient object URLs for binary previews.
//!
//! An [`ObjectUrl`] is created from a payload by an [`ObjectUrlFactory`] and
//! released when the guard is dropped. The guard is not `Clone`, so a handle
//! is released exactly once on every exit path: explicit close, replacement
//! by another document, or teardown of the owner.

use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempfile::TempDir;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ResourceError;

/// Backend that turns a payload into a locally addressable URL.
///
/// Both methods are synchronous: `revoke` runs from `Drop`, and `create` runs
/// while the desk applies a loaded payload.
pub trait ObjectUrlFactory: Send + Sync {
    fn create(&self, bytes: &Bytes, content_type: &str) -> Result<String, ResourceError>;

    fn revoke(&self, url: &str);
}

/// Owned object URL, revoked on drop.
pub struct ObjectUrl {
    url: String,
    factory: Arc<dyn ObjectUrlFactory>,
}

impl ObjectUrl {
    pub fn create(
        factory: Arc<dyn ObjectUrlFactory>,
        bytes: &Bytes,
        content_type: &str,
    ) -> Result<Self, ResourceError> {
        let url = factory.create(bytes, content_type)?;
        debug!(url = %url, content_type = %content_type, size = bytes.len(), "Created object URL");
        Ok(Self { url, factory })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.factory.revoke(&self.url);
        debug!(url = %self.url, "Released object URL");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Registry {
    live: HashMap<String, (Bytes, String)>,
    created: usize,
    revoked: usize,
}

/// In-memory `blob:` URL registry with live/revoked accounting.
#[derive(Default)]
pub struct MemoryObjectUrls {
    registry: Mutex<Registry>,
}

impl MemoryObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        lock(&self.registry).live.len()
    }

    pub fn created_count(&self) -> usize {
        lock(&self.registry).created
    }

    pub fn revoked_count(&self) -> usize {
        lock(&self.registry).revoked
    }

    pub fn is_live(&self, url: &str) -> bool {
        lock(&self.registry).live.contains_key(url)
    }

    /// Payload and content type behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<(Bytes, String)> {
        lock(&self.registry).live.get(url).cloned()
    }
}

impl ObjectUrlFactory for MemoryObjectUrls {
    fn create(&self, bytes: &Bytes, content_type: &str) -> Result<String, ResourceError> {
        let url = format!("blob:docdesk/{}", Uuid::new_v4());
        let mut registry = lock(&self.registry);
        registry
            .live
            .insert(url.clone(), (bytes.clone(), content_type.to_string()));
        registry.created += 1;
        Ok(url)
    }

    fn revoke(&self, url: &str) {
        let mut registry = lock(&self.registry);
        if registry.live.remove(url).is_some() {
            registry.revoked += 1;
        } else {
            warn!(url = %url, "Revoke of unknown object URL");
        }
    }
}

/// Run blocking file I/O without stalling other tasks on a multi-thread
/// runtime. `block_in_place` panics on a current-thread runtime, so there the
/// call runs inline.
fn blocking_io<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Writes each payload to a file in a private temporary directory and hands
/// out `file://` URLs. Revoking deletes the file; dropping the factory
/// deletes the directory. File writes and removals go through
/// [`blocking_io`].
pub struct TempFileObjectUrls {
    dir: TempDir,
    files: Mutex<HashMap<String, PathBuf>>,
}

impl TempFileObjectUrls {
    pub fn new() -> Result<Self, ResourceError> {
        let dir = tempfile::Builder::new().prefix("docdesk-").tempdir()?;
        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }

    pub fn live_count(&self) -> usize {
        lock(&self.files).len()
    }
}

impl ObjectUrlFactory for TempFileObjectUrls {
    fn create(&self, bytes: &Bytes, content_type: &str) -> Result<String, ResourceError> {
        let name = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension_for_content_type(content_type)
        );
        let path = self.dir.path().join(name);
        blocking_io(|| std::fs::write(&path, bytes))?;

        let url = format!("file://{}", path.display());
        lock(&self.files).insert(url.clone(), path);
        Ok(url)
    }

    fn revoke(&self, url: &str) {
        let Some(path) = lock(&self.files).remove(url) else {
            warn!(url = %url, "Revoke of unknown object URL");
            return;
        };
        if let Err(e) = blocking_io(|| std::fs::remove_file(&path)) {
            warn!(error = %e, path = %path.display(), "Failed to remove object URL file");
        }
    }
}

/// File extension for a media type, ignoring parameters (`; charset=...`).
fn extension_for_content_type(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        _ => "bin",
    }
}
