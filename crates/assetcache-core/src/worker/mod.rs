//! The offline asset cache controller.
//!
//! `OfflineWorker` reacts to the five lifecycle events its host delivers.
//! Handlers never call one another; the host decides when each runs and
//! keeps the worker alive until the returned future settles.

mod fetch;
mod push;

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, error, info};

use crate::cache::{add_all, CacheStorage};
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::host::WorkerHost;
use crate::models::{Notification, PushMessage, Request};
use crate::net::Network;

pub use fetch::{CacheWrite, FetchOutcome, ResponseSource};
pub use push::resolve_notification;

/// An event delivered by the host.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(PushMessage),
    NotificationClick(Notification),
}

impl WorkerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Push(_) => "push",
            WorkerEvent::NotificationClick(_) => "notificationclick",
        }
    }
}

/// Result of handling one event, one variant per handler.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchOutcome),
    Pushed(Notification),
    NotificationClicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    /// Number of manifest entries stored; zero when the bulk add failed.
    pub cached: usize,
    /// Why the bulk add failed, if it did.
    pub failed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    pub current: String,
    pub deleted: Vec<String>,
}

pub struct OfflineWorker {
    config: Arc<WorkerConfig>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn WorkerHost>,
}

impl OfflineWorker {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn WorkerHost>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            network,
            host,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Route an event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        debug!(event = event.name(), "Dispatching event");
        match event {
            WorkerEvent::Install => self.on_install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.on_activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => self.on_fetch(&request).await.map(EventOutcome::Fetched),
            WorkerEvent::Push(message) => self.on_push(&message).await.map(EventOutcome::Pushed),
            WorkerEvent::NotificationClick(notification) => self
                .on_notification_click(&notification)
                .await
                .map(|_| EventOutcome::NotificationClicked),
        }
    }

    /// Cache the asset manifest, then skip the waiting phase.
    ///
    /// A failed bulk add is logged and reported but does not fail the
    /// install: one bad manifest entry must not keep the worker from ever
    /// activating. Failing to open the cache or to skip waiting does.
    pub async fn on_install(&self) -> Result<InstallReport, WorkerError> {
        let cache_name = &self.config.cache_name;
        info!(cache = %cache_name, "Install event - caching core assets");

        let cache = self.storage.open(cache_name).await?;
        info!(cache = %cache_name, "Opened cache");

        let result = match self.config.manifest_urls() {
            Ok(urls) => {
                let requests: Vec<Request> = urls.into_iter().map(Request::get).collect();
                add_all(cache.as_ref(), self.network.as_ref(), &requests)
                    .await
                    .map_err(WorkerError::from)
            }
            Err(e) => Err(e.into()),
        };

        let report = match result {
            Ok(cached) => {
                info!(cache = %cache_name, cached, "Core assets cached successfully");
                InstallReport {
                    cache_name: cache_name.clone(),
                    cached,
                    failed: None,
                }
            }
            Err(e) => {
                error!(cache = %cache_name, error = %e, "Failed to cache initial resources");
                InstallReport {
                    cache_name: cache_name.clone(),
                    cached: 0,
                    failed: Some(e.to_string()),
                }
            }
        };

        info!("Skipping waiting");
        self.host.skip_waiting().await?;
        Ok(report)
    }

    /// Delete every cache not named by the current version, then claim clients.
    pub async fn on_activate(&self) -> Result<ActivateReport, WorkerError> {
        info!("Activate event - cleaning old caches");
        let current = &self.config.cache_name;

        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        try_join_all(stale.iter().map(|name| async move {
            info!(cache = %name, "Deleting old cache");
            self.storage.delete(name).await
        }))
        .await?;

        info!("Claiming clients");
        self.host.claim_clients().await?;

        Ok(ActivateReport {
            current: current.clone(),
            deleted: stale,
        })
    }

    /// Close the clicked notification and bring the app's root page forward.
    /// Data attached to the notification is not consulted.
    pub async fn on_notification_click(&self, notification: &Notification) -> Result<(), WorkerError> {
        info!(title = %notification.title, "Notification click received");
        self.host.close_notification(notification).await?;

        let target = self.config.resolve(&self.config.root_path)?;
        self.host.open_window(target.as_str()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(WorkerEvent::Install.name(), "install");
        assert_eq!(WorkerEvent::Push(PushMessage::empty()).name(), "push");
        let notification = Notification::from_defaults(&Default::default());
        assert_eq!(
            WorkerEvent::NotificationClick(notification).name(),
            "notificationclick"
        );
    }
}
