//! Offline asset cache controller.
//!
//! This crate implements the background worker that keeps a web application's
//! core assets available offline. The host environment drives five lifecycle
//! events into an [`OfflineWorker`]:
//!
//! - install: pre-populate the versioned cache from the asset manifest
//! - activate: delete caches left behind by previous versions
//! - fetch: answer requests cache-first, storing new same-origin successes
//! - push: display a notification built from the push payload
//! - notification click: close the notification and focus the app
//!
//! Storage, network and host capabilities are traits ([`CacheStorage`],
//! [`Network`], [`WorkerHost`]) so the controller can run against real
//! backends or test doubles.

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod net;
pub mod utils;
pub mod worker;

pub use cache::{add_all, Cache, CacheStorage, DiskCacheStorage, MemoryCacheStorage};
pub use config::{NotificationDefaults, WorkerConfig};
pub use error::{CacheError, ConfigError, HostError, NetworkError, WorkerError};
pub use host::WorkerHost;
pub use models::{
    Notification, NotificationOptions, PushMessage, Request, RequestKey, Response, ResponseType,
};
pub use net::{HttpNetwork, Network};
pub use worker::{
    ActivateReport, CacheWrite, EventOutcome, FetchOutcome, InstallReport, OfflineWorker,
    ResponseSource, WorkerEvent,
};
