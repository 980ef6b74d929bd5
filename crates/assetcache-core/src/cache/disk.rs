//! Durable cache storage backed by JSON files.
//!
//! Each named cache lives in `<root>/<base64url(name)>.json`. A file holds
//! the cache's creation time and its entries; response bodies are stored
//! base64-encoded. Every write rewrites the whole file through a temp file
//! and a rename, so a reader never sees a half-written cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ensure_get, Cache, CacheStorage, CachedData, EntrySummary};
use crate::error::CacheError;
use crate::models::{Request, RequestKey, Response, ResponseType};

const CACHE_FILE_EXT: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredCache {
    name: String,
    created_at: DateTime<Utc>,
    entries: Vec<CachedData<StoredEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: RequestKey,
    request_headers: Vec<(String, String)>,
    status: u16,
    status_text: String,
    kind: ResponseType,
    url: Option<String>,
    #[serde(default)]
    redirected: bool,
    headers: Vec<(String, String)>,
    body: String,
}

impl StoredEntry {
    fn new(request: &Request, response: Response) -> Self {
        Self {
            key: request.key(),
            request_headers: headers_to_pairs(&request.headers),
            status: response.status,
            status_text: response.status_text.clone(),
            kind: response.kind,
            url: response.url.as_ref().map(|u| u.to_string()),
            redirected: response.redirected,
            headers: headers_to_pairs(&response.headers),
            body: STANDARD.encode(response.bytes()),
        }
    }

    fn to_request(&self) -> Result<Request, CacheError> {
        let mut request = self
            .key
            .to_request()
            .ok_or_else(|| CacheError::Storage(format!("Invalid stored request: {}", self.key)))?;
        request.headers = pairs_to_headers(&self.request_headers);
        Ok(request)
    }

    fn to_response(&self) -> Result<Response, CacheError> {
        let body = STANDARD
            .decode(&self.body)
            .map_err(|e| CacheError::Storage(format!("Invalid stored body for {}: {}", self.key, e)))?;
        let url = self.url.as_deref().and_then(|u| Url::parse(u).ok());
        let mut response = Response::from_parts(
            self.status,
            self.status_text.clone(),
            self.kind,
            url,
            pairs_to_headers(&self.headers),
            Bytes::from(body),
        );
        response.redirected = self.redirected;
        Ok(response)
    }

    fn summary(&self) -> Result<EntrySummary, CacheError> {
        let size = STANDARD
            .decode(&self.body)
            .map(|b| b.len())
            .map_err(|e| CacheError::Storage(format!("Invalid stored body for {}: {}", self.key, e)))?;
        Ok(EntrySummary {
            key: self.key.clone(),
            status: self.status,
            kind: self.kind,
            size,
        })
    }
}

fn headers_to_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn pairs_to_headers(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = %name, "Skipping unreadable stored header"),
        }
    }
    headers
}

/// Cache storage persisted under a root directory.
#[derive(Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
    // Serialises every read-modify-write across all caches of this storage.
    lock: Arc<Mutex<()>>,
}

impl DiskCacheStorage {
    pub fn new(root: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            lock: Arc::new(Mutex::new(())),
        })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", URL_SAFE_NO_PAD.encode(name), CACHE_FILE_EXT))
    }

    fn handle(&self, name: &str) -> Arc<dyn Cache> {
        Arc::new(DiskCache {
            name: name.to_string(),
            path: self.cache_path(name),
            lock: self.lock.clone(),
        })
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError> {
        let _guard = self.lock.lock().await;
        let path = self.cache_path(name);
        if !path_exists(&path).await {
            let stored = StoredCache {
                name: name.to_string(),
                created_at: Utc::now(),
                entries: Vec::new(),
            };
            write_cache(&path, &stored).await?;
            debug!(cache = name, path = %path.display(), "Created cache file");
        }
        Ok(self.handle(name))
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(path_exists(&self.cache_path(name)).await)
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let _guard = self.lock.lock().await;
        let mut found = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_FILE_EXT) {
                continue;
            }
            match read_cache(&path).await {
                Ok(stored) => found.push((stored.created_at, stored.name)),
                // Still listed so the cache can be deleted; sorts as oldest.
                Err(e) => match name_from_path(&path) {
                    Some(name) => {
                        warn!(cache = %name, error = %e, "Cache file is unreadable");
                        found.push((DateTime::<Utc>::MIN_UTC, name));
                    }
                    None => warn!(path = %path.display(), error = %e, "Skipping unreadable cache file"),
                },
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, name)| name).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(self.cache_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Handle to one on-disk cache.
///
/// Writes to a cache whose file has been deleted are dropped, matching the
/// behaviour of a handle that outlives its cache's deletion.
pub struct DiskCache {
    name: String,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DiskCache {
    async fn load(&self) -> Result<Option<StoredCache>, CacheError> {
        if !path_exists(&self.path).await {
            return Ok(None);
        }
        read_cache(&self.path).await.map(Some)
    }

    async fn upsert(&self, entries: Vec<StoredEntry>) -> Result<(), CacheError> {
        let _guard = self.lock.lock().await;
        let mut stored = match self.load().await? {
            Some(stored) => stored,
            None => {
                debug!(cache = %self.name, "Cache deleted, dropping write");
                return Ok(());
            }
        };
        for entry in entries {
            stored.entries.retain(|e| e.data.key != entry.key);
            stored.entries.push(CachedData::new(entry));
        }
        write_cache(&self.path, &stored).await
    }
}

#[async_trait]
impl Cache for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, CacheError> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = request.key();
        let _guard = self.lock.lock().await;
        match self.load().await? {
            Some(stored) => stored
                .entries
                .iter()
                .find(|e| e.data.key == key)
                .map(|e| e.data.to_response())
                .transpose(),
            None => Ok(None),
        }
    }

    async fn put(&self, request: &Request, response: Response) -> Result<(), CacheError> {
        ensure_get(request)?;
        self.upsert(vec![StoredEntry::new(request, response)]).await
    }

    async fn put_all(&self, entries: Vec<(Request, Response)>) -> Result<(), CacheError> {
        for (request, _) in &entries {
            ensure_get(request)?;
        }
        let stored = entries
            .into_iter()
            .map(|(request, response)| StoredEntry::new(&request, response))
            .collect();
        self.upsert(stored).await
    }

    async fn delete(&self, request: &Request) -> Result<bool, CacheError> {
        let key = request.key();
        let _guard = self.lock.lock().await;
        let mut stored = match self.load().await? {
            Some(stored) => stored,
            None => return Ok(false),
        };
        let before = stored.entries.len();
        stored.entries.retain(|e| e.data.key != key);
        if stored.entries.len() == before {
            return Ok(false);
        }
        write_cache(&self.path, &stored).await?;
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<Request>, CacheError> {
        let _guard = self.lock.lock().await;
        match self.load().await? {
            Some(stored) => stored.entries.iter().map(|e| e.data.to_request()).collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn entries(&self) -> Result<Vec<CachedData<EntrySummary>>, CacheError> {
        let _guard = self.lock.lock().await;
        let stored = match self.load().await? {
            Some(stored) => stored,
            None => return Ok(Vec::new()),
        };
        let mut summaries = stored
            .entries
            .iter()
            .map(|e| {
                Ok(CachedData {
                    data: e.data.summary()?,
                    cached_at: e.cached_at,
                })
            })
            .collect::<Result<Vec<_>, CacheError>>()?;
        summaries.sort_by(|a, b| a.data.key.cmp(&b.data.key));
        Ok(summaries)
    }
}

/// Recover a cache name from its `<base64url(name)>.json` file name.
fn name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

async fn read_cache(path: &Path) -> Result<StoredCache, CacheError> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

async fn write_cache(path: &Path, stored: &StoredCache) -> Result<(), CacheError> {
    let contents = serde_json::to_string(stored)?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
