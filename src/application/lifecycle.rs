use super::correlator::RequestCorrelator;
use crate::domain::ports::{ActivityContext, ActivityResultListener, PaymentGatewayRef};
use crate::domain::request::{ActivityResultEvent, RequestCode};
use crate::domain::response::PaymentResponse;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, info};

pub const CANCELLED_OR_FAILED: &str = "Payment cancelled or failed";

/// Non-owning holder for the currently attached host context.
#[derive(Clone, Default)]
pub struct ActivitySlot {
    inner: Arc<RwLock<Option<Weak<dyn ActivityContext>>>>,
}

impl ActivitySlot {
    pub fn set(&self, activity: &Arc<dyn ActivityContext>) {
        let activity = Arc::downgrade(activity);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(activity);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The attached context, if one is attached and still alive.
    pub fn current(&self) -> Option<Arc<dyn ActivityContext>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Detached,
    Attached,
}

/// How an activity result was dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityResultDisposition {
    /// Matched the pending request and went to the gateway.
    Forwarded,
    /// Did not match the pending request, which was resolved as failed.
    FallbackResolved,
    /// Nothing to route it to.
    Ignored,
}

impl ActivityResultDisposition {
    pub fn is_handled(self) -> bool {
        !matches!(self, ActivityResultDisposition::Ignored)
    }
}

/// Keeps the payment flow attached to whichever host context is live and routes
/// activity results back to the pending request.
///
/// Detaching only drops the context reference. The pending request and its claim
/// live in the [`RequestCorrelator`] and are never touched by attach or detach.
pub struct ActivityLifecycleBridge {
    correlator: Arc<RequestCorrelator>,
    gateway: PaymentGatewayRef,
    activity: ActivitySlot,
}

impl ActivityLifecycleBridge {
    pub fn new(
        correlator: Arc<RequestCorrelator>,
        gateway: PaymentGatewayRef,
        activity: ActivitySlot,
    ) -> Self {
        Self {
            correlator,
            gateway,
            activity,
        }
    }

    /// Associates a host context and registers for its activity results. Used both
    /// for the first attach and for reattaching after a configuration change.
    pub fn attach(self: &Arc<Self>, activity: &Arc<dyn ActivityContext>) {
        self.activity.set(activity);
        let listener: Arc<dyn ActivityResultListener> = self.clone();
        activity.add_activity_result_listener(Arc::downgrade(&listener));
        info!(
            activity = activity.name(),
            pending = self.correlator.is_busy(),
            "attached to activity"
        );
    }

    pub fn detach(&self) {
        self.activity.clear();
        info!(pending = self.correlator.is_busy(), "detached from activity");
    }

    pub fn state(&self) -> LifecycleState {
        match self.activity.current() {
            Some(_) => LifecycleState::Attached,
            None => LifecycleState::Detached,
        }
    }

    pub fn handle_activity_result(&self, event: ActivityResultEvent) -> ActivityResultDisposition {
        let Some(request) = self.correlator.current_request() else {
            debug!(request_code = event.request_code, "activity result with no pending request");
            return ActivityResultDisposition::Ignored;
        };
        let activity = self.activity.current();

        if event.request_code == request.request_code().code() {
            let Some(activity) = activity else {
                debug!(request_code = event.request_code, "no attached activity, cannot dispatch");
                return ActivityResultDisposition::Ignored;
            };
            self.gateway.on_activity_result(activity.as_ref(), event);
            return ActivityResultDisposition::Forwarded;
        }

        debug!(
            request_id = request.id(),
            expected = request.request_code().code(),
            received = event.request_code,
            "activity result does not match pending request"
        );
        if let (Ok(_), Some(activity)) = (RequestCode::try_from(event.request_code), activity) {
            self.gateway.on_activity_result(activity.as_ref(), event);
        }
        request.resolve(Ok(PaymentResponse::failure(CANCELLED_OR_FAILED)));
        ActivityResultDisposition::FallbackResolved
    }
}

impl ActivityResultListener for ActivityLifecycleBridge {
    fn on_activity_result(&self, event: ActivityResultEvent) -> bool {
        self.handle_activity_result(event).is_handled()
    }
}
