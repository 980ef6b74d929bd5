use std::fmt;

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// An intercepted outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parse an absolute URL into a GET request.
    pub fn parse(url: &str) -> Result<Self, NetworkError> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidRequest(format!("{}: {}", url, e)))?;
        Ok(Self::get(url))
    }

    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: reqwest::header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Cache identity of this request. Headers are ignored and the fragment
    /// is dropped, so `/a.png#x` and `/a.png` share an entry.
    pub fn key(&self) -> RequestKey {
        let mut url = self.url.clone();
        url.set_fragment(None);
        RequestKey {
            method: self.method.as_str().to_string(),
            url: url.to_string(),
        }
    }
}

/// Identity of a cached entry: method plus fragment-less URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Rebuild a bare request (no headers) from a stored key.
    pub fn to_request(&self) -> Option<Request> {
        let method = Method::from_bytes(self.method.as_bytes()).ok()?;
        let url = Url::parse(&self.url).ok()?;
        Some(Request::new(method, url))
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
