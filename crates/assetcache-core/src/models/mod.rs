//! Data models for intercepted traffic and notifications.
//!
//! - `Request`, `RequestKey`: an intercepted request and its cache identity
//! - `Response`, `ResponseType`: a network or cached response with its classification
//! - `Notification`, `PushMessage`: push payloads and the notifications built from them

pub mod notification;
pub mod request;
pub mod response;

pub use notification::{Notification, NotificationOptions, PushMessage};
pub use request::{Request, RequestKey};
pub use response::{Response, ResponseType};
