use super::notification::{LocalNotification, NotificationAction, PermissionStatus};
use super::params::SubmissionParams;
use super::request::{ActivityResultEvent, RequestCode};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Weak};

/// Completion of the gateway's raw submission call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitCompletion {
    pub raw_response: Option<Map<String, Value>>,
    pub error_message: Option<String>,
}

impl SubmitCompletion {
    pub fn response(raw: Map<String, Value>) -> Self {
        Self {
            raw_response: Some(raw),
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            raw_response: None,
            error_message: Some(message.into()),
        }
    }
}

/// Completion of the gateway's interactive checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutCompletion {
    pub payment_completed: bool,
    pub error_message: Option<String>,
}

impl CheckoutCompletion {
    pub fn completed() -> Self {
        Self {
            payment_completed: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            payment_completed: false,
            error_message: Some(message.into()),
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn is_initialized(&self) -> bool;

    async fn submit(&self, params: SubmissionParams) -> Result<SubmitCompletion>;

    /// Drives the interactive checkout. `activity` is the currently attached host
    /// context, if any.
    async fn checkout(
        &self,
        params: SubmissionParams,
        activity: Option<Arc<dyn ActivityContext>>,
    ) -> CheckoutCompletion;

    /// Hands a host activity result to the gateway for interpretation.
    fn on_activity_result(&self, activity: &dyn ActivityContext, event: ActivityResultEvent);
}

pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;

/// A live UI context supplied by the host.
pub trait ActivityContext: Send + Sync {
    fn name(&self) -> &str;
    fn launch_checkout(&self, request_code: RequestCode, params: &SubmissionParams);
    fn add_activity_result_listener(&self, listener: Weak<dyn ActivityResultListener>);
}

pub trait ActivityResultListener: Send + Sync {
    /// Returns true when the event was handled.
    fn on_activity_result(&self, event: ActivityResultEvent) -> bool;
}

/// OS-level notification presentation.
pub trait NotificationPresenter: Send + Sync {
    fn request_permissions(&self) -> PermissionStatus;
    fn show(&self, notification: LocalNotification) -> Result<()>;
    fn cancel_all(&self);
    fn are_enabled(&self) -> bool;
}

/// The UI-side receiver of opened notifications.
pub trait NotificationListener: Send + Sync {
    fn is_ready(&self) -> bool;
    fn on_notification_opened(&self, payload: &str, action: NotificationAction) -> Result<()>;
}
