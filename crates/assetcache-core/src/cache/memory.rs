use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ensure_get, Cache, CacheStorage, CachedData, EntrySummary};
use crate::error::CacheError;
use crate::models::{Request, RequestKey, Response};

/// Process-local cache storage.
///
/// Clones share the same caches. A cache handle keeps working after its name
/// is deleted, but its contents are no longer reachable through the storage.
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    caches: Arc<RwLock<Vec<Arc<MemoryCache>>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError> {
        let mut caches = self.caches.write().await;
        if let Some(existing) = caches.iter().find(|c| c.name == name) {
            let cache: Arc<dyn Cache> = existing.clone();
            return Ok(cache);
        }
        let cache = Arc::new(MemoryCache::new(name));
        caches.push(cache.clone());
        let cache: Arc<dyn Cache> = cache;
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.caches.read().await.iter().any(|c| c.name == name))
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .caches
            .read()
            .await
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let mut caches = self.caches.write().await;
        let before = caches.len();
        caches.retain(|c| c.name != name);
        Ok(caches.len() != before)
    }
}

pub struct MemoryCache {
    name: String,
    entries: RwLock<HashMap<RequestKey, CachedData<(Request, Response)>>>,
}

impl MemoryCache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, CacheError> {
        if !request.is_get() {
            return Ok(None);
        }
        let entries = self.entries.read().await;
        Ok(entries
            .get(&request.key())
            .map(|cached| cached.data.1.duplicate()))
    }

    async fn put(&self, request: &Request, response: Response) -> Result<(), CacheError> {
        ensure_get(request)?;
        self.entries
            .write()
            .await
            .insert(request.key(), CachedData::new((request.clone(), response)));
        Ok(())
    }

    async fn put_all(&self, entries: Vec<(Request, Response)>) -> Result<(), CacheError> {
        for (request, _) in &entries {
            ensure_get(request)?;
        }
        let mut stored = self.entries.write().await;
        for (request, response) in entries {
            stored.insert(request.key(), CachedData::new((request, response)));
        }
        Ok(())
    }

    async fn delete(&self, request: &Request) -> Result<bool, CacheError> {
        Ok(self.entries.write().await.remove(&request.key()).is_some())
    }

    async fn keys(&self) -> Result<Vec<Request>, CacheError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .map(|cached| cached.data.0.clone())
            .collect())
    }

    async fn entries(&self) -> Result<Vec<CachedData<EntrySummary>>, CacheError> {
        let entries = self.entries.read().await;
        let mut summaries: Vec<_> = entries
            .iter()
            .map(|(key, cached)| CachedData {
                data: EntrySummary {
                    key: key.clone(),
                    status: cached.data.1.status,
                    kind: cached.data.1.kind,
                    size: cached.data.1.content_length(),
                },
                cached_at: cached.cached_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.data.key.cmp(&b.data.key));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn get(url: &str) -> Request {
        Request::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let storage = MemoryCacheStorage::new();
        let a = storage.open("v1").await.unwrap();
        a.put(&get("http://a.test/x"), Response::basic(200, "x")).await.unwrap();

        let b = storage.open("v1").await.unwrap();
        assert!(b.match_request(&get("http://a.test/x")).await.unwrap().is_some());
        assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let storage = MemoryCacheStorage::new();
        for name in ["v3", "v1", "v2"] {
            storage.open(name).await.unwrap();
        }
        assert_eq!(storage.keys().await.unwrap(), vec!["v3", "v1", "v2"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = MemoryCacheStorage::new();
        storage.open("v1").await.unwrap();
        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert!(!storage.has("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let req = get("http://a.test/x");
        cache.put(&req, Response::basic(200, "first")).await.unwrap();
        cache.put(&req, Response::basic(200, "second")).await.unwrap();

        let hit = cache.match_request(&req).await.unwrap().unwrap();
        assert_eq!(hit.text(), "second");
        assert_eq!(cache.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_get_never_matches_or_stores() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let post = Request::new(Method::POST, "http://a.test/x".parse().unwrap());

        assert!(matches!(
            cache.put(&post, Response::basic(200, "x")).await,
            Err(CacheError::UnsupportedMethod(_))
        ));
        cache.put(&get("http://a.test/x"), Response::basic(200, "x")).await.unwrap();
        assert!(cache.match_request(&post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_summarise() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        cache.put(&get("http://a.test/b"), Response::basic(200, "bb")).await.unwrap();
        cache.put(&get("http://a.test/a"), Response::basic(200, "a")).await.unwrap();

        let entries = cache.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].data.key.url, "http://a.test/a");
        assert_eq!(entries[1].data.size, 2);
        assert_eq!(entries[0].age_display(), "just now");
    }
}
