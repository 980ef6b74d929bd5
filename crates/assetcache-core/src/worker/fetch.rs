use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::OfflineWorker;
use crate::cache::CacheStorage;
use crate::error::WorkerError;
use crate::models::{Request, RequestKey, Response};

/// Where the response handed back to the host came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    /// The network failed and the configured offline page was served.
    Fallback,
    /// The network failed and nothing was served; the host applies its own
    /// error handling.
    NetworkFailed,
}

/// A background write of a network response into the current cache.
///
/// The write is started before the response is handed back and is never
/// awaited by the fetch handler itself.
#[derive(Debug)]
pub struct CacheWrite {
    key: RequestKey,
    handle: JoinHandle<()>,
}

impl CacheWrite {
    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Wait for the write to settle. Store errors were already logged by the task.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            warn!(key = %self.key, error = %e, "Cache write task aborted");
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Option<Response>,
    pub source: ResponseSource,
    pub cache_write: Option<CacheWrite>,
}

impl FetchOutcome {
    fn served(response: Response, source: ResponseSource) -> Self {
        Self {
            response: Some(response),
            source,
            cache_write: None,
        }
    }
}

impl OfflineWorker {
    /// Answer a request cache-first.
    ///
    /// The current cache is always consulted before the network. On a miss
    /// the request goes out unmodified; a same-origin 200 is duplicated, one
    /// copy returned and the other written to the cache in the background.
    /// Concurrent misses for the same URL are not coalesced.
    pub async fn on_fetch(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        let cache_name = &self.config.cache_name;

        if self.storage.has(cache_name).await? {
            let cache = self.storage.open(cache_name).await?;
            if let Some(hit) = cache.match_request(request).await? {
                debug!(url = %request.url, "Serving from cache");
                return Ok(FetchOutcome::served(hit, ResponseSource::Cache));
            }
        }

        debug!(url = %request.url, "Fetching from network");
        let response = match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "Fetch failed");
                return self.offline_fallback().await;
            }
        };

        if !response.is_cacheable() {
            debug!(
                url = %request.url,
                status = response.status,
                kind = %response.kind,
                "Not caching response"
            );
            return Ok(FetchOutcome::served(response, ResponseSource::Network));
        }

        let to_cache = response.duplicate();
        let cache_write = spawn_cache_write(
            self.storage.clone(),
            cache_name.clone(),
            request.clone(),
            to_cache,
        );

        Ok(FetchOutcome {
            response: Some(response),
            source: ResponseSource::Network,
            cache_write: Some(cache_write),
        })
    }

    async fn offline_fallback(&self) -> Result<FetchOutcome, WorkerError> {
        let none = FetchOutcome {
            response: None,
            source: ResponseSource::NetworkFailed,
            cache_write: None,
        };

        let Some(locator) = self.config.offline_fallback.as_deref() else {
            return Ok(none);
        };
        let cache_name = &self.config.cache_name;
        if !self.storage.has(cache_name).await? {
            return Ok(none);
        }

        let fallback = Request::get(self.config.resolve(locator)?);
        let cache = self.storage.open(cache_name).await?;
        match cache.match_request(&fallback).await? {
            Some(page) => {
                debug!(url = %fallback.url, "Serving offline fallback");
                Ok(FetchOutcome::served(page, ResponseSource::Fallback))
            }
            None => Ok(none),
        }
    }
}

fn spawn_cache_write(
    storage: Arc<dyn CacheStorage>,
    cache_name: String,
    request: Request,
    response: Response,
) -> CacheWrite {
    let key = request.key();
    let handle = tokio::spawn(async move {
        let result = match storage.open(&cache_name).await {
            Ok(cache) => cache.put(&request, response).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!(cache = %cache_name, url = %request.url, "Cached new resource"),
            Err(e) => warn!(cache = %cache_name, url = %request.url, error = %e, "Failed to cache resource"),
        }
    });
    CacheWrite { key, handle }
}
