// Intercepted request model and canonical cache identity
// Author: kelexine (https://github.com/kelexine)

use crate::error::Result;
use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

/// A request observed at the interception boundary.
///
/// Cheap to clone: the body is reference counted, so the strategies and the
/// deferred retry path can each hold their own copy.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Resolve `target` (absolute URL or origin-relative path) against `base`.
    pub fn resolve(method: Method, base: &Url, target: &str) -> Result<Self> {
        Ok(Self::new(method, base.join(target)?))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// GET/HEAD/OPTIONS: safe to serve from and write into a cache.
    pub fn is_read_only(&self) -> bool {
        is_read_only(&self.method)
    }

    /// Non-idempotent methods that qualify for a deferred retry intent.
    pub fn is_mutating(&self) -> bool {
        is_mutating(&self.method)
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

pub fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

pub fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PATCH)
}

/// Canonical identity of a request inside a cache generation.
///
/// Two requests are the same entry when their methods match and their URLs
/// are equal after parsing, with any fragment dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    method: String,
    url: String,
}

impl RequestKey {
    pub fn new(method: &Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.as_str().to_string(),
            url: url.to_string(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET.as_str()
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
