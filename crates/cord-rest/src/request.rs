//! Request and response value types
//!
//! `RestRequest` is transport-agnostic and cheap to rebuild, so the
//! dispatcher can re-issue the same request after a 429 without keeping a
//! consumed body around.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

/// Per-request coordination context threaded through the middleware
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Rate-limit key from the route
    pub rl_key: String,
    /// Short alphanumeric id correlating logs and errors for one request
    pub trace: String,
}

impl RequestContext {
    /// Build a context for a rate-limit key with a fresh trace id
    #[must_use]
    pub fn new(rl_key: String) -> Self {
        let mut trace = uuid::Uuid::new_v4().simple().to_string();
        trace.truncate(6);
        Self { rl_key, trace }
    }
}

/// Request body polymorphism
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized with `Content-Type: application/json`
    Json(Value),
    /// Multipart form upload
    Multipart(Multipart),
}

/// Multipart form description
///
/// `payload_json` becomes a text part of the same name; files become
/// sequentially numbered parts (`0`, `1`, ...).
#[derive(Debug, Clone, Default)]
pub struct Multipart {
    pub payload_json: Option<Value>,
    pub files: Vec<FileUpload>,
}

impl Multipart {
    /// Empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the JSON side-payload
    #[must_use]
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload_json = Some(payload);
        self
    }

    /// Append one file
    #[must_use]
    pub fn file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    /// Build from a filename-to-bytes mapping; entries become numbered
    /// form keys in iteration order
    #[must_use]
    pub fn from_named(files: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            payload_json: None,
            files: files
                .into_iter()
                .map(|(filename, data)| FileUpload::new(filename, data))
                .collect(),
        }
    }
}

/// One uploaded file
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl FileUpload {
    /// Create an upload with no explicit content type
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
            content_type: None,
        }
    }

    /// Set an explicit content type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A fully assembled request, ready for a transport
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub ctx: RequestContext,
}

/// A transport response with undecoded body
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Caller-supplied request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Audit-log reason, sent as `X-Audit-Log-Reason`
    pub reason: Option<String>,
}

impl RequestOptions {
    /// No query, no body, no reason
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one query pair
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Use a JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Use a multipart body
    #[must_use]
    pub fn multipart(mut self, form: Multipart) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Attach an audit-log reason
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_is_short_alphanumeric() {
        let ctx = RequestContext::new("get:/gateway:".to_string());
        assert_eq!(ctx.trace.len(), 6);
        assert!(ctx.trace.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_traces_are_unique_enough() {
        let a = RequestContext::new("k".into());
        let b = RequestContext::new("k".into());
        assert_ne!(a.trace, b.trace);
    }

    #[test]
    fn test_multipart_from_named_preserves_order() {
        let form = Multipart::from_named(vec![
            ("a.png".to_string(), vec![1]),
            ("b.png".to_string(), vec![2]),
        ]);
        assert_eq!(form.files[0].filename, "a.png");
        assert_eq!(form.files[1].filename, "b.png");
    }
}
