//! Named cache stores for offline access.
//!
//! A `CacheStorage` holds any number of caches, each identified by a version
//! string. A `Cache` maps request identity (method + URL) to a stored
//! response. Two backends are provided:
//! - `MemoryCacheStorage`: process-local, used in tests and embedding
//! - `DiskCacheStorage`: one JSON file per named cache under a root directory

pub mod disk;
pub mod entry;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::debug;

use crate::error::CacheError;
use crate::models::{Request, Response};
use crate::net::Network;

pub use disk::DiskCacheStorage;
pub use entry::{CachedData, EntrySummary};
pub use memory::MemoryCacheStorage;

/// The set of named caches owned by the worker's origin.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the named cache, creating it empty when absent.
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError>;

    async fn has(&self, name: &str) -> Result<bool, CacheError>;

    /// Names of every existing cache, oldest first.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Delete the named cache. Returns false when it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;
}

/// One named cache of request/response pairs.
#[async_trait]
pub trait Cache: Send + Sync {
    fn name(&self) -> &str;

    /// Look up a stored response. Headers are not compared and only GET
    /// requests can match.
    async fn match_request(&self, request: &Request) -> Result<Option<Response>, CacheError>;

    /// Store a response, overwriting any entry with the same key.
    async fn put(&self, request: &Request, response: Response) -> Result<(), CacheError>;

    /// Store several responses at once. Either all entries are written or none.
    async fn put_all(&self, entries: Vec<(Request, Response)>) -> Result<(), CacheError>;

    async fn delete(&self, request: &Request) -> Result<bool, CacheError>;

    /// Requests of every stored entry.
    async fn keys(&self) -> Result<Vec<Request>, CacheError>;

    /// Metadata of every stored entry, with the time it was cached.
    async fn entries(&self) -> Result<Vec<CachedData<EntrySummary>>, CacheError>;
}

pub(crate) fn ensure_get(request: &Request) -> Result<(), CacheError> {
    if request.is_get() {
        Ok(())
    } else {
        Err(CacheError::UnsupportedMethod(request.method.to_string()))
    }
}

/// Fetch every request and store the results as one all-or-nothing operation.
///
/// All fetches run concurrently. If any fetch fails or returns a status
/// outside 200-299, nothing is written to the cache. Returns the number of
/// requests stored.
pub async fn add_all(
    cache: &dyn Cache,
    network: &dyn Network,
    requests: &[Request],
) -> Result<usize, CacheError> {
    for request in requests {
        ensure_get(request)?;
    }

    let fetches = requests.iter().map(|request| async move {
        let response = network
            .fetch(request)
            .await
            .map_err(|e| CacheError::AddFailed {
                url: request.url.to_string(),
                reason: e.to_string(),
            })?;
        if !response.ok() {
            return Err(CacheError::AddFailed {
                url: request.url.to_string(),
                reason: format!("status {}", response.status),
            });
        }
        Ok::<_, CacheError>((request.clone(), response))
    });

    let entries = try_join_all(fetches).await?;
    let count = entries.len();
    cache.put_all(entries).await?;

    debug!(cache = cache.name(), count, "Bulk add complete");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use reqwest::Method;
    use std::collections::HashMap;

    struct StaticNetwork {
        routes: HashMap<String, u16>,
    }

    #[async_trait]
    impl Network for StaticNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
            match self.routes.get(request.url.as_str()) {
                Some(&status) => Ok(Response::basic(status, request.url.path().to_string())),
                None => Err(NetworkError::Unavailable(request.url.to_string())),
            }
        }
    }

    fn network(routes: &[(&str, u16)]) -> StaticNetwork {
        StaticNetwork {
            routes: routes.iter().map(|(u, s)| (u.to_string(), *s)).collect(),
        }
    }

    fn requests(urls: &[&str]) -> Vec<Request> {
        urls.iter().map(|u| Request::parse(u).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_add_all_stores_every_entry() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let net = network(&[("http://a.test/", 200), ("http://a.test/x.png", 200)]);

        let count = add_all(cache.as_ref(), &net, &requests(&["http://a.test/", "http://a.test/x.png"]))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(cache.keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_all_writes_nothing_on_missing_entry() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let net = network(&[("http://a.test/", 200)]);

        let result = add_all(cache.as_ref(), &net, &requests(&["http://a.test/", "http://a.test/gone.png"])).await;
        assert!(matches!(result, Err(CacheError::AddFailed { .. })));
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_all_rejects_error_status() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let net = network(&[("http://a.test/", 200), ("http://a.test/404", 404)]);

        let result = add_all(cache.as_ref(), &net, &requests(&["http://a.test/", "http://a.test/404"])).await;
        match result {
            Err(CacheError::AddFailed { reason, .. }) => assert_eq!(reason, "status 404"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_all_rejects_non_get() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let net = network(&[("http://a.test/", 200)]);
        let post = Request::new(Method::POST, "http://a.test/".parse().unwrap());

        let result = add_all(cache.as_ref(), &net, &[post]).await;
        assert!(matches!(result, Err(CacheError::UnsupportedMethod(_))));
    }

    #[tokio::test]
    async fn test_add_all_collapses_duplicates() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let net = network(&[("http://a.test/", 200)]);

        add_all(cache.as_ref(), &net, &requests(&["http://a.test/", "http://a.test/"]))
            .await
            .unwrap();
        assert_eq!(cache.keys().await.unwrap().len(), 1);
    }
}
