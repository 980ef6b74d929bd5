use serde_json::{Number, Value};
use tracing::info;

use super::OfflineWorker;
use crate::config::NotificationDefaults;
use crate::error::WorkerError;
use crate::models::{Notification, PushMessage};
use crate::utils::truncate_string;

/// Longest payload excerpt written to the log.
const MAX_LOGGED_PAYLOAD: usize = 200;

/// Build the notification for a push message.
///
/// A JSON object payload overrides `title`, `body` and `icon` with any truthy
/// value it carries; the badge always keeps its default. A payload that is
/// not JSON (or is JSON `null`) becomes the body verbatim. Any other JSON
/// value leaves the defaults untouched.
pub fn resolve_notification(defaults: &NotificationDefaults, message: &PushMessage) -> Notification {
    let mut notification = Notification::from_defaults(defaults);
    let Some(text) = message.text() else {
        return notification;
    };

    match message.json() {
        Some(Ok(Value::Object(data))) => {
            if let Some(title) = truthy_string(data.get("title")) {
                notification.title = title;
            }
            if let Some(body) = truthy_string(data.get("body")) {
                notification.options.body = body;
            }
            if let Some(icon) = truthy_string(data.get("icon")) {
                notification.options.icon = icon;
            }
        }
        Some(Ok(Value::Null)) | Some(Err(_)) | None => notification.options.body = text,
        Some(Ok(_)) => {}
    }
    notification
}

/// The string form of a truthy scalar. Empty strings, `0`, `false`, `null`
/// and structured values yield `None`.
fn truthy_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_string(n)),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Render a number the way a script's string coercion does: integral
/// floats lose their fractional part.
fn number_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
            format!("{}", f as i128)
        }
        _ => n.to_string(),
    }
}

impl OfflineWorker {
    /// Show a notification built from the push payload. Completes once the
    /// host has displayed it.
    pub async fn on_push(&self, message: &PushMessage) -> Result<Notification, WorkerError> {
        info!("Push received");
        let payload = message
            .text()
            .map(|t| truncate_string(&t, MAX_LOGGED_PAYLOAD))
            .unwrap_or_else(|| "no payload".to_string());
        info!(payload = %payload, "Push had this data");

        let notification = resolve_notification(&self.config.notification, message);
        self.host.show_notification(&notification).await?;
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(payload: Option<&'static str>) -> Notification {
        let message = match payload {
            Some(p) => PushMessage::new(p),
            None => PushMessage::empty(),
        };
        resolve_notification(&NotificationDefaults::default(), &message)
    }

    #[test]
    fn test_no_payload_uses_defaults() {
        assert_eq!(
            resolve(None),
            Notification::from_defaults(&NotificationDefaults::default())
        );
    }

    #[test]
    fn test_structured_payload_overrides() {
        let n = resolve(Some(r#"{"title":"A","body":"B"}"#));
        assert_eq!(n.title, "A");
        assert_eq!(n.options.body, "B");
        assert_eq!(n.options.icon, "icons/llama-icon-192.png");
        assert_eq!(n.options.badge, "icons/llama-icon-192.png");
    }

    #[test]
    fn test_icon_override_but_not_badge() {
        let n = resolve(Some(r#"{"icon":"icons/alert.png","badge":"icons/other.png"}"#));
        assert_eq!(n.options.icon, "icons/alert.png");
        assert_eq!(n.options.badge, "icons/llama-icon-192.png");
        assert_eq!(n.title, "Llama Time!");
    }

    #[test]
    fn test_plain_text_becomes_body() {
        let n = resolve(Some("Feed the llamas"));
        assert_eq!(n.title, "Llama Time!");
        assert_eq!(n.options.body, "Feed the llamas");
    }

    #[test]
    fn test_falsy_fields_keep_defaults() {
        let n = resolve(Some(r#"{"title":"","body":0,"icon":null}"#));
        assert_eq!(n, resolve(None));
    }

    #[test]
    fn test_scalar_fields_are_stringified() {
        let n = resolve(Some(r#"{"title":42,"body":true}"#));
        assert_eq!(n.title, "42");
        assert_eq!(n.options.body, "true");
    }

    #[test]
    fn test_integral_floats_drop_fraction() {
        let n = resolve(Some(r#"{"title":1.0,"body":1e2,"icon":2.5}"#));
        assert_eq!(n.title, "1");
        assert_eq!(n.options.body, "100");
        assert_eq!(n.options.icon, "2.5");
    }

    #[test]
    fn test_json_null_falls_back_to_text() {
        assert_eq!(resolve(Some("null")).options.body, "null");
    }

    #[test]
    fn test_non_object_json_keeps_defaults() {
        assert_eq!(resolve(Some(r#""just a string""#)), resolve(None));
        assert_eq!(resolve(Some("[1,2]")), resolve(None));
        assert_eq!(resolve(Some("7")), resolve(None));
    }

    #[test]
    fn test_empty_payload_clears_body() {
        assert_eq!(resolve(Some("")).options.body, "");
    }
}
