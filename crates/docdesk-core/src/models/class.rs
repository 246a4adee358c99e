use serde::{Deserialize, Serialize};

use crate::constants::BINARY_EXTENSIONS;

/// How a binary document is shown once its object URL exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryRenderer {
    /// Embedded document frame (PDF).
    EmbeddedFrame,
    Image,
}

/// Rendering class of a document, decided from its filename extension.
///
/// Every binary extension has a renderer, so a document can never be loaded
/// as bytes and then have nothing to display it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    Binary(BinaryRenderer),
    Text,
}

impl DocumentClass {
    pub fn for_name(name: &str) -> Self {
        match extension_of(name) {
            Some(ext) if ext == "pdf" => DocumentClass::Binary(BinaryRenderer::EmbeddedFrame),
            Some(ext) if BINARY_EXTENSIONS.contains(&ext.as_str()) => {
                DocumentClass::Binary(BinaryRenderer::Image)
            }
            _ => DocumentClass::Text,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, DocumentClass::Binary(_))
    }
}

/// Lowercased text after the last '.', if the name has one.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Media type for a binary extension, used when the server sends none.
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
