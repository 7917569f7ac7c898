use super::delivery::DeliveryContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::{Notify, oneshot};

struct Delivery<T> {
    reply: oneshot::Sender<T>,
    context: DeliveryContext,
    release: Option<Box<dyn FnOnce() + Send>>,
}

/// Resolve-once delivery of a single value.
///
/// The first [`ResultClaim::resolve`] wins and its value is delivered on the
/// claim's [`DeliveryContext`]; every later call is a silent no-op. The winner is
/// picked by one compare-and-set on `resolved`, so the delivery cell below is only
/// ever touched by that winner.
pub struct ResultClaim<T> {
    resolved: AtomicBool,
    delivery: Mutex<Option<Delivery<T>>>,
    notify: Notify,
}

impl<T: Send + 'static> ResultClaim<T> {
    pub fn new(context: DeliveryContext) -> (Self, oneshot::Receiver<T>) {
        Self::build(context, None)
    }

    /// Like [`ResultClaim::new`], but `release` runs exactly once, right before the
    /// winning value is posted for delivery.
    pub fn with_release<F>(context: DeliveryContext, release: F) -> (Self, oneshot::Receiver<T>)
    where
        F: FnOnce() + Send + 'static,
    {
        Self::build(context, Some(Box::new(release)))
    }

    fn build(
        context: DeliveryContext,
        release: Option<Box<dyn FnOnce() + Send>>,
    ) -> (Self, oneshot::Receiver<T>) {
        let (reply, receiver) = oneshot::channel();
        let claim = Self {
            resolved: AtomicBool::new(false),
            delivery: Mutex::new(Some(Delivery {
                reply,
                context,
                release,
            })),
            notify: Notify::new(),
        };
        (claim, receiver)
    }

    /// Returns true if this call resolved the claim. A false return means another
    /// value already won and `value` has been dropped.
    pub fn resolve(&self, value: T) -> bool {
        if self
            .resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let delivery = self
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Delivery {
            reply,
            context,
            release,
        }) = delivery
        {
            if let Some(release) = release {
                release();
            }
            context.post(move || {
                // The caller may have stopped waiting; nothing to do then.
                let _ = reply.send(value);
            });
        }
        self.notify.notify_waiters();
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    /// Completes once the claim has been resolved by anyone.
    pub async fn resolved(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_resolved() {
            return;
        }
        notified.await;
    }
}
