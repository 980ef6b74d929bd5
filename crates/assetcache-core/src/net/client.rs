//! reqwest-backed network transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::Network;
use crate::config::WorkerConfig;
use crate::error::NetworkError;
use crate::models::{Request, Response, ResponseType};

/// HTTP transport for the worker.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

impl HttpNetwork {
    /// Create a transport for a worker registered at `scope`. Responses whose
    /// final URL shares the scope's origin are classified as `basic`.
    pub fn new(scope: Url, timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            origin: scope,
        })
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, NetworkError> {
        let scope = config
            .scope_url()
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        Self::new(scope, Duration::from_secs(config.request_timeout_secs))
    }

    fn classify(&self, final_url: &Url) -> ResponseType {
        if final_url.origin() == self.origin.origin() {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let kind = self.classify(&final_url);
        let redirected = final_url != request.url;
        debug!(url = %request.url, status = status.as_u16(), kind = %kind, redirected, "Network response");

        let mut response = Response::from_parts(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default().to_string(),
            kind,
            Some(final_url),
            headers,
            body,
        );
        response.redirected = redirected;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(scope: &str) -> HttpNetwork {
        HttpNetwork::new(scope.parse().unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_classify_same_origin_is_basic() {
        let net = network("http://localhost:8080/");
        let url: Url = "http://localhost:8080/icons/a.png".parse().unwrap();
        assert_eq!(net.classify(&url), ResponseType::Basic);
    }

    #[test]
    fn test_classify_cross_origin_is_cors() {
        let net = network("http://localhost:8080/");
        let fonts: Url = "https://fonts.gstatic.com/s/x.woff2".parse().unwrap();
        let other_port: Url = "http://localhost:9090/".parse().unwrap();
        assert_eq!(net.classify(&fonts), ResponseType::Cors);
        assert_eq!(net.classify(&other_port), ResponseType::Cors);
    }

    #[test]
    fn test_from_config_rejects_bad_scope() {
        let config = WorkerConfig {
            scope: "::".to_string(),
            ..WorkerConfig::default()
        };
        assert!(matches!(
            HttpNetwork::from_config(&config),
            Err(NetworkError::InvalidRequest(_))
        ));
    }
}
