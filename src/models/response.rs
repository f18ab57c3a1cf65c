// Response snapshots exchanged between network, cache and caller
// Author: kelexine (https://github.com/kelexine)

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// How the response relates to the origin that requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same origin, not redirected. The only kind the static cache accepts.
    Basic,
    /// Cross-origin response with a readable body.
    Cors,
    /// Cross-origin response with no readable status or body.
    Opaque,
    /// Synthesized by the offline layer itself.
    Synthetic,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Synthetic => "synthetic",
        }
    }
}

/// An immutable response snapshot.
///
/// Cloning shares the body buffer, so handing one copy to the caller and
/// another to a cache write never copies the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub response_type: ResponseType,
    pub redirected: bool,
}

impl FetchResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
            redirected: false,
        }
    }

    pub fn with_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    /// Convenience constructor for JSON payloads.
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    /// Plain-text notice served when a static resource is unreachable.
    /// Carries the default success status so navigations do not hard-fail.
    pub fn offline_page(text: &str) -> Self {
        Self::new(StatusCode::OK, text.to_string())
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
            .with_type(ResponseType::Synthetic)
    }

    /// Structured error served when an API read has neither network nor cache.
    pub fn offline_api(message: &str) -> Self {
        Self::json(StatusCode::SERVICE_UNAVAILABLE, &json!({ "error": message }))
            .with_type(ResponseType::Synthetic)
    }

    /// 2xx
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Eligible for the static generation: a basic, non-redirected 200.
    pub fn is_static_cacheable(&self) -> bool {
        self.status == StatusCode::OK
            && self.response_type == ResponseType::Basic
            && !self.redirected
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}
