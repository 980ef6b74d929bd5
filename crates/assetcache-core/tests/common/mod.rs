#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assetcache_core::cache::{CachedData, EntrySummary};
use assetcache_core::{
    Cache, CacheError, CacheStorage, HostError, MemoryCacheStorage, Network, NetworkError,
    Notification, OfflineWorker, Request, Response, ResponseType, WorkerConfig, WorkerHost,
};
use async_trait::async_trait;

pub const SCOPE: &str = "http://localhost:8080/";

pub fn url(path: &str) -> String {
    format!("http://localhost:8080{}", path)
}

pub fn get(path: &str) -> Request {
    Request::parse(&url(path)).unwrap()
}

/// Network double serving canned responses and counting every call.
#[derive(Default)]
pub struct CountingNetwork {
    routes: Mutex<HashMap<String, (u16, ResponseType, String)>>,
    calls: AtomicUsize,
}

impl CountingNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, status: u16, kind: ResponseType, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, kind, body.to_string()));
        self
    }

    /// Same-origin 200 for `path`.
    pub fn ok(self, path: &str, body: &str) -> Self {
        self.route(&url(path), 200, ResponseType::Basic, body)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for CountingNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let routes = self.routes.lock().unwrap();
        match routes.get(request.url.as_str()) {
            Some((status, kind, body)) => Ok(Response::new(*status, body.clone())
                .with_kind(*kind)
                .with_url(request.url.clone())),
            None => Err(NetworkError::Unavailable(request.url.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    SkipWaiting,
    ClaimClients,
    Show(Notification),
    Close(Notification),
    OpenWindow(String),
}

/// Host double recording every primitive the worker invokes.
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    fail_notifications: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_notifications() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_notifications: true,
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn skip_waiting(&self) -> Result<(), HostError> {
        self.record(HostCall::SkipWaiting);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), HostError> {
        self.record(HostCall::ClaimClients);
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), HostError> {
        if self.fail_notifications {
            return Err(HostError::Notification("permission denied".to_string()));
        }
        self.record(HostCall::Show(notification.clone()));
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) -> Result<(), HostError> {
        self.record(HostCall::Close(notification.clone()));
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), HostError> {
        self.record(HostCall::OpenWindow(url.to_string()));
        Ok(())
    }
}

/// Storage whose caches accept reads but reject every write.
#[derive(Default)]
pub struct ReadOnlyStorage {
    inner: MemoryCacheStorage,
}

impl ReadOnlyStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for ReadOnlyStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError> {
        let inner = self.inner.open(name).await?;
        let cache: Arc<dyn Cache> = Arc::new(ReadOnlyCache { inner });
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        self.inner.has(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        self.inner.delete(name).await
    }
}

struct ReadOnlyCache {
    inner: Arc<dyn Cache>,
}

#[async_trait]
impl Cache for ReadOnlyCache {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, CacheError> {
        self.inner.match_request(request).await
    }

    async fn put(&self, _request: &Request, _response: Response) -> Result<(), CacheError> {
        Err(CacheError::Storage("quota exceeded".to_string()))
    }

    async fn put_all(&self, _entries: Vec<(Request, Response)>) -> Result<(), CacheError> {
        Err(CacheError::Storage("quota exceeded".to_string()))
    }

    async fn delete(&self, request: &Request) -> Result<bool, CacheError> {
        self.inner.delete(request).await
    }

    async fn keys(&self) -> Result<Vec<Request>, CacheError> {
        self.inner.keys().await
    }

    async fn entries(&self) -> Result<Vec<CachedData<EntrySummary>>, CacheError> {
        self.inner.entries().await
    }
}

pub fn config(cache_name: &str, manifest: &[&str]) -> WorkerConfig {
    WorkerConfig {
        cache_name: cache_name.to_string(),
        urls_to_cache: manifest.iter().map(|s| s.to_string()).collect(),
        scope: SCOPE.to_string(),
        ..WorkerConfig::default()
    }
}

pub struct Harness {
    pub worker: OfflineWorker,
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<CountingNetwork>,
    pub host: Arc<RecordingHost>,
}

pub fn harness(config: WorkerConfig, storage: Arc<dyn CacheStorage>, network: CountingNetwork) -> Harness {
    harness_with_host(config, storage, network, RecordingHost::new())
}

pub fn harness_with_host(
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: CountingNetwork,
    host: RecordingHost,
) -> Harness {
    let network = Arc::new(network);
    let host = Arc::new(host);
    let worker = OfflineWorker::new(config, storage.clone(), network.clone(), host.clone());
    Harness {
        worker,
        storage,
        network,
        host,
    }
}
