//! Network transport used on cache misses and during install.
//!
//! The worker only needs one capability from the network: issue a request and
//! get back a classified response. `HttpNetwork` provides it over reqwest.

pub mod client;

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::models::{Request, Response};

pub use client::HttpNetwork;

#[async_trait]
pub trait Network: Send + Sync {
    /// Issue the request unmodified. Any completed HTTP exchange is `Ok`,
    /// whatever its status; `Err` means no response was obtained.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
