//! Capabilities the hosting environment exposes to the worker.

use async_trait::async_trait;

use crate::error::HostError;
use crate::models::Notification;

/// Lifecycle signalling, notification display and client-window control.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Make a freshly installed worker eligible for activation without
    /// waiting for pages controlled by the old worker to close.
    async fn skip_waiting(&self) -> Result<(), HostError>;

    /// Take control of every open page immediately.
    async fn claim_clients(&self) -> Result<(), HostError>;

    /// Display a system notification. Completes once it is shown.
    async fn show_notification(&self, notification: &Notification) -> Result<(), HostError>;

    async fn close_notification(&self, notification: &Notification) -> Result<(), HostError>;

    /// Focus or open a client window at `url`.
    async fn open_window(&self, url: &str) -> Result<(), HostError>;
}
