use crate::domain::ports::CheckoutCompletion;
use crate::domain::request::{ActivityResultEvent, RequestCode};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

/// Checkouts waiting on the host activity result for their request code.
#[derive(Default)]
pub struct CheckoutWaiters {
    waiters: Mutex<HashMap<i32, oneshot::Sender<CheckoutCompletion>>>,
}

/// A registered checkout; resolves when its activity result arrives.
pub struct CheckoutWait {
    receiver: oneshot::Receiver<CheckoutCompletion>,
}

impl CheckoutWait {
    pub async fn completion(self) -> CheckoutCompletion {
        self.receiver
            .await
            .unwrap_or_else(|_| CheckoutCompletion::failed("Checkout superseded"))
    }
}

impl CheckoutWaiters {
    /// Registers a waiter for `request_code`, replacing any earlier one.
    pub fn register(&self, request_code: RequestCode) -> CheckoutWait {
        let (sender, receiver) = oneshot::channel();
        let previous = self
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_code.code(), sender);
        if previous.is_some() {
            debug!(%request_code, "replaced an earlier checkout waiter");
        }
        CheckoutWait { receiver }
    }

    /// Completes the waiter matching the event's request code. Returns false if
    /// nobody was waiting or the waiter has gone away.
    pub fn complete(&self, event: &ActivityResultEvent) -> bool {
        let sender = self
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event.request_code);
        match sender {
            Some(sender) => sender.send(completion_for(event)).is_ok(),
            None => false,
        }
    }
}

/// Interprets a checkout screen's activity result.
pub fn completion_for(event: &ActivityResultEvent) -> CheckoutCompletion {
    match event.result_code {
        ActivityResultEvent::RESULT_OK => CheckoutCompletion::completed(),
        ActivityResultEvent::RESULT_CANCELED => CheckoutCompletion::failed("Payment cancelled"),
        _ => CheckoutCompletion {
            payment_completed: false,
            error_message: event.message().map(str::to_string),
        },
    }
}
