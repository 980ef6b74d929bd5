//! Terminal implementation of the worker's host primitives.
//!
//! There are no real pages to claim or windows to open from a terminal, so
//! lifecycle signals are logged and notifications are printed to stdout.

use assetcache_core::{HostError, Notification, WorkerHost};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleHost;

#[async_trait]
impl WorkerHost for ConsoleHost {
    async fn skip_waiting(&self) -> Result<(), HostError> {
        info!("Worker eligible for immediate activation");
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), HostError> {
        info!("Worker controls all open clients");
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), HostError> {
        println!("[notification] {}", notification.title);
        println!("  {}", notification.options.body);
        println!("  icon: {}  badge: {}", notification.options.icon, notification.options.badge);
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) -> Result<(), HostError> {
        info!(title = %notification.title, "Notification closed");
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), HostError> {
        println!("Opening {}", url);
        Ok(())
    }
}
