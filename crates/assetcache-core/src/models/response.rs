use std::fmt;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

/// Classification of a response relative to the worker's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response with full access to status, headers and body.
    Basic,
    /// Cross-origin response obtained with CORS.
    Cors,
    /// Constructed locally rather than fetched.
    Default,
    Error,
    /// Cross-origin response with hidden status and body.
    Opaque,
    OpaqueRedirect,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseType::Basic => write!(f, "basic"),
            ResponseType::Cors => write!(f, "cors"),
            ResponseType::Default => write!(f, "default"),
            ResponseType::Error => write!(f, "error"),
            ResponseType::Opaque => write!(f, "opaque"),
            ResponseType::OpaqueRedirect => write!(f, "opaqueredirect"),
        }
    }
}

/// A response from the network or a cache store.
///
/// Reading the body consumes the response. A response that must be both
/// handed to a caller and written to a store is split with [`Response::duplicate`].
#[derive(Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub kind: ResponseType,
    pub url: Option<Url>,
    pub redirected: bool,
    pub headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            kind: ResponseType::Default,
            url: None,
            redirected: false,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// A same-origin response, as a fetch from the worker's own origin produces.
    pub fn basic(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status, body).with_kind(ResponseType::Basic)
    }

    /// Rebuild a response from stored parts.
    pub fn from_parts(
        status: u16,
        status_text: String,
        kind: ResponseType,
        url: Option<Url>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            status,
            status_text,
            kind,
            url,
            redirected: false,
            headers,
            body,
        }
    }

    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only a plain same-origin 200 is stored opportunistically.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic
    }

    /// Produce an independent copy with its own unread body.
    pub fn duplicate(&self) -> Response {
        Response {
            status: self.status,
            status_text: self.status_text.clone(),
            kind: self.kind,
            url: self.url.clone(),
            redirected: self.redirected,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    pub fn bytes(self) -> Bytes {
        self.body
    }

    pub fn text(self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
