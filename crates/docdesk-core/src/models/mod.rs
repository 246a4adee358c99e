//! Data models for the application
//!
//! `document` holds the canonical document entity and its wire descriptor;
//! `class` decides how a document is rendered from its filename.

mod class;
mod document;

pub use class::*;
pub use document::*;
