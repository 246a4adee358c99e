use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::{UNKNOWN_DATE, UNTITLED};

/// Server-assigned document identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A server-stored file as known to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub size_bytes: Option<u64>,
    pub content_type: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            uploaded_at: None,
            size_bytes: None,
            content_type: None,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNTITLED
        } else {
            &self.name
        }
    }

    /// Upload date as `YYYY-MM-DD`, or "Unknown".
    pub fn display_date(&self) -> String {
        match self.uploaded_at {
            Some(at) => at.format("%Y-%m-%d").to_string(),
            None => UNKNOWN_DATE.to_string(),
        }
    }
}

/// Document entry as returned by the list and upload endpoints.
///
/// Every field is optional on the wire: the list endpoint sends
/// `{id, name, filename, uploaded_at, size, content_type}`, the upload
/// endpoint only `{message, filename}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DocumentDescriptor {
    /// Normalize into a [`Document`]. Returns `None` when the entry carries
    /// no usable identity (`id`, then `name`, then `filename`).
    pub fn into_document(self) -> Option<Document> {
        let name = non_empty(self.name).or_else(|| non_empty(self.filename.clone()));
        let id = non_empty(self.id).or_else(|| name.clone())?;

        Some(Document {
            name: name.unwrap_or_else(|| id.clone()),
            id: DocumentId(id),
            uploaded_at: self.uploaded_at.or(self.created_at),
            size_bytes: self.size,
            content_type: non_empty(self.content_type),
        })
    }

    /// Normalize an upload response, filling gaps from the local file.
    pub fn into_uploaded_document(self, local_name: &str, local_size: u64) -> Document {
        let size = self.size.unwrap_or(local_size);
        let fallback = Document {
            id: DocumentId::new(local_name),
            name: local_name.to_string(),
            uploaded_at: None,
            size_bytes: Some(local_size),
            content_type: None,
        };

        match self.into_document() {
            Some(mut document) => {
                document.size_bytes = Some(size);
                document
            }
            None => fallback,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accept RFC 3339 timestamps as well as naive ISO timestamps (taken as UTC).
/// Unparseable values become `None` rather than failing the whole list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| parse_timestamp(&value)))
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
