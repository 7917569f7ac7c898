use super::{MethodCall, MethodError, MethodResult};
use crate::application::notifications::NotificationRoutingBridge;
use crate::domain::notification::{LocalNotification, NotificationAction};
use crate::domain::ports::NotificationListener;
use crate::error::{ExpressPayError, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const CHANNEL_NAME: &str = "com.yourcompany.notifications";
pub const ON_NOTIFICATION_OPENED: &str = "onNotificationOpened";

/// The notification side of the call boundary.
///
/// Incoming calls are answered through [`NotificationChannel::handle`]; opened
/// notifications are pushed to the UI layer as outgoing `onNotificationOpened`
/// calls on the queue returned by [`NotificationChannel::connect`].
pub struct NotificationChannel {
    bridge: Arc<NotificationRoutingBridge>,
}

impl NotificationChannel {
    pub fn new(bridge: Arc<NotificationRoutingBridge>) -> Self {
        Self { bridge }
    }

    /// Opens the outgoing queue and marks the UI listener ready. Any buffered
    /// payload is pushed straight away.
    pub fn connect(&self) -> mpsc::UnboundedReceiver<MethodCall> {
        let (outgoing, receiver) = mpsc::unbounded_channel();
        self.bridge.set_listener(Arc::new(ChannelListener { outgoing }));
        receiver
    }

    pub async fn handle(&self, call: MethodCall) -> MethodResult {
        let args = &call.arguments;
        match call.method.as_str() {
            "requestPermissions" => Ok(json!(self.bridge.request_permissions().as_str())),
            "test" => Ok(json!(self.bridge.test())),
            "showNotification" => {
                self.bridge.show_notification(local_notification(args)?)?;
                Ok(Value::Null)
            }
            "cancelAllNotifications" => {
                self.bridge.cancel_all_notifications();
                Ok(Value::Null)
            }
            "areNotificationsEnabled" => Ok(json!(self.bridge.are_notifications_enabled())),
            "getNotificationPayload" => Ok(self
                .bridge
                .notification_payload()
                .map(Value::String)
                .unwrap_or(Value::Null)),
            other => Err(MethodError::not_implemented(other)),
        }
    }
}

fn local_notification(args: &Value) -> Result<LocalNotification> {
    let id = args
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ExpressPayError::InvalidArguments("id must be an integer".to_string()))?;
    let title = required_text(args, "title")?;
    let body = required_text(args, "body")?;
    let payload = match args.get("payload") {
        None | Some(Value::Null) => None,
        Some(Value::String(p)) => Some(p.clone()),
        Some(_) => {
            return Err(ExpressPayError::InvalidArguments(
                "payload must be a string".to_string(),
            ));
        }
    };
    Ok(LocalNotification {
        id,
        title,
        body,
        payload,
    })
}

fn required_text(args: &Value, key: &str) -> Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ExpressPayError::InvalidArguments(format!("{key} must be a string")))
}

struct ChannelListener {
    outgoing: mpsc::UnboundedSender<MethodCall>,
}

impl NotificationListener for ChannelListener {
    fn is_ready(&self) -> bool {
        !self.outgoing.is_closed()
    }

    fn on_notification_opened(&self, payload: &str, action: NotificationAction) -> Result<()> {
        let call = MethodCall::new(
            ON_NOTIFICATION_OPENED,
            json!({ "payload": payload, "action": action.as_str() }),
        );
        self.outgoing
            .send(call)
            .map_err(|_| ExpressPayError::ListenerUnavailable("UI channel closed".to_string()))
    }
}
