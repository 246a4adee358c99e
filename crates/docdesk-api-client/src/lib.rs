//! HTTP client for the docdesk document service.
//!
//! Provides a small reqwest-based client with JSON helpers that map every
//! failure onto [`StoreError`], the [`DocumentStore`] trait the session
//! components depend on, and domain methods (list, fetch, upload, delete,
//! chat).

pub mod api;
mod progress;
pub mod store;

pub use api::{ChatRequest, ChatResponse};
pub use store::{
    BinaryContent, DeleteConfirmation, DocumentStore, ProgressFn, TextContent, UploadFile,
};

use anyhow::{Context, Result};
use docdesk_core::{ClientConfig, StoreError, StoreResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the document service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` includes the route prefix, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.service_url(), config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request and turn non-success statuses into a [`StoreError`].
    pub(crate) async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        Ok(response)
    }

    /// GET request. Deserializes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> StoreResult<T> {
        let request = self.client.get(self.build_url(path));
        let response = self.send(request).await?;
        response.json().await.map_err(transport_error)
    }

    /// POST a JSON body and deserialize the response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> StoreResult<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        response.json().await.map_err(transport_error)
    }

    /// POST a multipart form and deserialize the response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> StoreResult<T> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        let response = self.send(request).await?;
        response.json().await.map_err(transport_error)
    }

    /// DELETE request. Returns the raw response body.
    pub async fn delete(&self, path: &str) -> StoreResult<bytes::Bytes> {
        let request = self.client.delete(self.build_url(path));
        let response = self.send(request).await?;
        response.bytes().await.map_err(transport_error)
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Transport(format!("Invalid response body: {}", err))
    } else {
        StoreError::Transport(err.to_string())
    }
}

/// Classify a failed response.
///
/// 404 means the target is gone, other 4xx statuses mean the server rejected
/// the input, everything else is treated as unavailability.
pub fn error_from_response(status: StatusCode, body: &str) -> StoreError {
    let message = extract_message(body);
    if status == StatusCode::NOT_FOUND {
        StoreError::NotFound(message.unwrap_or_else(|| "Document not found".to_string()))
    } else if status.is_client_error() {
        StoreError::Validation(message.unwrap_or_default())
    } else {
        StoreError::Transport(format!(
            "HTTP {}: {}",
            status,
            message.as_deref().unwrap_or("no response body")
        ))
    }
}

/// Human-readable text carried by an error body: JSON `message`, then JSON
/// `detail`, then the raw text when the body is not JSON.
pub fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ["message", "detail"]
            .iter()
            .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string),
        Err(_) => Some(body.to_string()),
    }
}

/// Percent-encode a document id for use in a path, keeping `/` separators
/// (ids are storage object names and may contain them).
pub fn encode_id(id: &str) -> String {
    id.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_prefers_message_then_detail() {
        assert_eq!(
            extract_message(r#"{"message": "Unsupported file type", "detail": "x"}"#),
            Some("Unsupported file type".to_string())
        );
        assert_eq!(
            extract_message(r#"{"detail": "File not found"}"#),
            Some("File not found".to_string())
        );
        assert_eq!(extract_message(r#"{"message": "  ", "detail": "d"}"#), Some("d".to_string()));
    }

    #[test]
    fn test_extract_message_non_json_and_empty() {
        assert_eq!(
            extract_message("Bad Gateway\n"),
            Some("Bad Gateway".to_string())
        );
        assert_eq!(extract_message("   "), None);
        assert_eq!(extract_message(r#"{"detail": [{"loc": ["body"]}]}"#), None);
    }

    #[test]
    fn test_error_classification() {
        let err = error_from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "Unsupported file type: .exe"}"#,
        );
        assert_eq!(
            err,
            StoreError::Validation("Unsupported file type: .exe".to_string())
        );

        let err = error_from_response(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());

        let err = error_from_response(StatusCode::BAD_REQUEST, "");
        assert_eq!(err.detail(), None);

        let err = error_from_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": "boom"}"#);
        assert!(matches!(err, StoreError::Transport(ref msg) if msg.contains("500")));
    }

    #[test]
    fn test_encode_id_keeps_separators() {
        assert_eq!(encode_id("reports/q3 final.pdf"), "reports/q3%20final.pdf");
        assert_eq!(encode_id("a?b#c"), "a%3Fb%23c");
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.build_url("/files"), "http://localhost:8000/api/files");
    }
}
