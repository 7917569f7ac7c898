use crate::domain::notification::{LocalNotification, NotificationPayload, PermissionStatus};
use crate::domain::ports::{NotificationListener, NotificationPresenter};
use crate::error::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info};

pub const TEST_REPLY: &str = "Notification service is working";

/// Holds at most one opened-notification payload until the UI layer takes it.
///
/// A newer payload overwrites an undelivered older one. Push delivery clears the
/// buffer; a pull through [`NotificationRoutingBridge::notification_payload`]
/// leaves it in place.
pub struct NotificationRoutingBridge {
    presenter: Arc<dyn NotificationPresenter>,
    listener: RwLock<Option<Arc<dyn NotificationListener>>>,
    buffer: Mutex<Option<NotificationPayload>>,
}

impl NotificationRoutingBridge {
    pub fn new(presenter: Arc<dyn NotificationPresenter>) -> Self {
        Self {
            presenter,
            listener: RwLock::new(None),
            buffer: Mutex::new(None),
        }
    }

    /// Entry point for an OS-originated "notification opened" event.
    pub fn on_notification_event(&self, payload: Option<&str>) {
        let Some(payload) = payload.filter(|p| !p.is_empty()) else {
            debug!("ignoring notification event without payload");
            return;
        };
        let notification = NotificationPayload::new(payload);
        info!(action = %notification.action, "notification opened");
        if let Some(previous) = self.buffer().replace(notification) {
            debug!(overwritten_at = %previous.buffered_at, "overwrote undelivered notification");
        }
        self.deliver_pending();
    }

    /// Installs the UI-side listener and flushes any buffered payload to it.
    pub fn set_listener(&self, listener: Arc<dyn NotificationListener>) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = Some(listener);
        self.deliver_pending();
    }

    pub fn clear_listener(&self) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Pushes the buffered payload to a ready listener. Returns true if a payload
    /// was delivered; otherwise it stays buffered.
    ///
    /// The payload leaves the buffer before the push, so overlapping deliveries
    /// never hand the same payload out twice.
    pub fn deliver_pending(&self) -> bool {
        let Some(listener) = self.ready_listener() else {
            return false;
        };
        let Some(pending) = self.buffer().take() else {
            return false;
        };

        match listener.on_notification_opened(&pending.payload, pending.action) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "notification push failed, keeping payload buffered");
                let mut buffer = self.buffer();
                // A newer payload that arrived during the push wins.
                if buffer.is_none() {
                    *buffer = Some(pending);
                }
                false
            }
        }
    }

    /// The buffered payload, if any. Does not clear the buffer.
    pub fn notification_payload(&self) -> Option<String> {
        self.buffer().as_ref().map(|n| n.payload.clone())
    }

    pub fn pending(&self) -> Option<NotificationPayload> {
        self.buffer().clone()
    }

    pub fn request_permissions(&self) -> PermissionStatus {
        self.presenter.request_permissions()
    }

    pub fn test(&self) -> &'static str {
        TEST_REPLY
    }

    pub fn show_notification(&self, notification: LocalNotification) -> Result<()> {
        debug!(id = notification.id, "showing notification");
        self.presenter.show(notification)
    }

    pub fn cancel_all_notifications(&self) {
        self.presenter.cancel_all();
    }

    pub fn are_notifications_enabled(&self) -> bool {
        self.presenter.are_enabled()
    }

    fn ready_listener(&self) -> Option<Arc<dyn NotificationListener>> {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|l| l.is_ready())
            .cloned()
    }

    fn buffer(&self) -> MutexGuard<'_, Option<NotificationPayload>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::NotificationAction;
    use crate::error::ExpressPayError;
    use crate::infrastructure::in_memory::InMemoryPresenter;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct TestListener {
        ready: AtomicBool,
        fail: AtomicBool,
        received: Mutex<Vec<(String, NotificationAction)>>,
    }

    impl NotificationListener for TestListener {
        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        fn on_notification_opened(&self, payload: &str, action: NotificationAction) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ExpressPayError::ListenerUnavailable("engine gone".into()));
            }
            self.received.lock().unwrap().push((payload.to_string(), action));
            Ok(())
        }
    }

    fn bridge() -> NotificationRoutingBridge {
        NotificationRoutingBridge::new(Arc::new(InMemoryPresenter::default()))
    }

    #[test]
    fn test_buffers_without_listener_and_overwrites() {
        let bridge = bridge();
        bridge.on_notification_event(Some("first"));
        bridge.on_notification_event(Some("order_placed:42"));

        let pending = bridge.pending().unwrap();
        assert_eq!(pending.payload, "order_placed:42");
        assert_eq!(pending.action, NotificationAction::OpenOrderTracking);
    }

    #[test]
    fn test_empty_payload_ignored() {
        let bridge = bridge();
        bridge.on_notification_event(Some(""));
        bridge.on_notification_event(None);
        assert!(bridge.pending().is_none());
    }

    #[test]
    fn test_pull_does_not_clear() {
        let bridge = bridge();
        bridge.on_notification_event(Some("promo"));
        assert_eq!(bridge.notification_payload().as_deref(), Some("promo"));
        assert_eq!(bridge.notification_payload().as_deref(), Some("promo"));
    }

    #[test]
    fn test_ready_listener_receives_latest_only() {
        let bridge = bridge();
        bridge.on_notification_event(Some("first"));
        bridge.on_notification_event(Some("second"));

        let listener = Arc::new(TestListener::default());
        listener.ready.store(true, Ordering::SeqCst);
        bridge.set_listener(listener.clone());

        assert_eq!(
            *listener.received.lock().unwrap(),
            vec![("second".to_string(), NotificationAction::OpenNotifications)]
        );
        assert!(bridge.pending().is_none());
    }

    #[test]
    fn test_failed_push_keeps_buffer() {
        let bridge = bridge();
        let listener = Arc::new(TestListener::default());
        listener.ready.store(true, Ordering::SeqCst);
        listener.fail.store(true, Ordering::SeqCst);
        bridge.set_listener(listener.clone());

        bridge.on_notification_event(Some("promo"));
        assert_eq!(bridge.notification_payload().as_deref(), Some("promo"));

        listener.fail.store(false, Ordering::SeqCst);
        assert!(bridge.deliver_pending());
        assert!(bridge.pending().is_none());
    }

    struct SlowListener {
        received: Mutex<Vec<String>>,
    }

    impl NotificationListener for SlowListener {
        fn is_ready(&self) -> bool {
            true
        }

        fn on_notification_opened(&self, payload: &str, _action: NotificationAction) -> Result<()> {
            std::thread::sleep(std::time::Duration::from_millis(50));
            self.received.lock().unwrap().push(payload.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_overlapping_deliveries_push_once() {
        let bridge = Arc::new(bridge());
        let listener = Arc::new(SlowListener {
            received: Mutex::new(Vec::new()),
        });
        bridge.set_listener(listener.clone());

        let arriving = {
            let bridge = bridge.clone();
            std::thread::spawn(move || bridge.on_notification_event(Some("order_placed:1")))
        };
        std::thread::sleep(std::time::Duration::from_millis(10));
        bridge.set_listener(listener.clone());
        arriving.join().unwrap();

        assert_eq!(*listener.received.lock().unwrap(), vec!["order_placed:1".to_string()]);
        assert!(bridge.pending().is_none());
    }

    #[test]
    fn test_failed_push_does_not_clobber_newer_payload() {
        let bridge = bridge();
        let listener = Arc::new(TestListener::default());
        listener.ready.store(true, Ordering::SeqCst);
        listener.fail.store(true, Ordering::SeqCst);
        bridge.set_listener(listener.clone());

        bridge.on_notification_event(Some("first"));
        bridge.on_notification_event(Some("second"));
        assert_eq!(bridge.notification_payload().as_deref(), Some("second"));
    }

    #[test]
    fn test_unready_listener_does_not_receive() {
        let bridge = bridge();
        let listener = Arc::new(TestListener::default());
        bridge.set_listener(listener.clone());
        bridge.on_notification_event(Some("promo"));

        assert!(listener.received.lock().unwrap().is_empty());
        assert!(!bridge.deliver_pending());
        assert!(bridge.pending().is_some());
    }
}
