use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::NotificationDefaults;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
}

/// A system notification requested by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub options: NotificationOptions,
}

impl Notification {
    pub fn from_defaults(defaults: &NotificationDefaults) -> Self {
        Self {
            title: defaults.title.clone(),
            options: NotificationOptions {
                body: defaults.body.clone(),
                icon: defaults.icon.clone(),
                badge: defaults.badge.clone(),
            },
        }
    }
}

/// An inbound push message with an optional payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushMessage {
    pub data: Option<Bytes>,
}

impl PushMessage {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Payload as text; invalid UTF-8 is replaced rather than rejected.
    pub fn text(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|d| String::from_utf8_lossy(d).into_owned())
    }

    pub fn json(&self) -> Option<serde_json::Result<serde_json::Value>> {
        self.data.as_ref().map(|d| serde_json::from_slice(d))
    }
}
