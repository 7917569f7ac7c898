use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const ORDER_PLACED_MARKERS: [&str; 2] = ["order_placed", "order placed"];

/// Screen the UI layer should open for a tapped notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationAction {
    OpenOrderTracking,
    OpenNotifications,
}

impl NotificationAction {
    /// Classifies a payload by content: anything carrying an order-placed marker
    /// opens order tracking, everything else the notification list.
    pub fn classify(payload: &str) -> Self {
        let lowered = payload.to_lowercase();
        if ORDER_PLACED_MARKERS.iter().any(|m| lowered.contains(m)) {
            NotificationAction::OpenOrderTracking
        } else {
            NotificationAction::OpenNotifications
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationAction::OpenOrderTracking => "OPEN_ORDER_TRACKING",
            NotificationAction::OpenNotifications => "OPEN_NOTIFICATIONS",
        }
    }
}

impl fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification payload waiting to reach the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub payload: String,
    pub action: NotificationAction,
    pub buffered_at: DateTime<Utc>,
}

impl NotificationPayload {
    pub fn new(payload: impl Into<String>) -> Self {
        let payload = payload.into();
        let action = NotificationAction::classify(&payload);
        Self {
            payload,
            action,
            buffered_at: Utc::now(),
        }
    }
}

/// A local notification to present through the OS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalNotification {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    NotDetermined,
}

impl PermissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::NotDetermined => "notDetermined",
        }
    }
}
