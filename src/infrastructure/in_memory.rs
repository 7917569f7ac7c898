use super::checkout::CheckoutWaiters;
use crate::domain::notification::{LocalNotification, PermissionStatus};
use crate::domain::params::SubmissionParams;
use crate::domain::ports::{
    ActivityContext, ActivityResultListener, CheckoutCompletion, NotificationPresenter,
    PaymentGateway, SubmitCompletion,
};
use crate::domain::request::{ActivityResultEvent, RequestCode};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One scripted completion of a gateway operation.
pub enum Step<T> {
    Complete { delay: Duration, value: T },
    /// The operation faults.
    Panic,
}

impl<T> Step<T> {
    pub fn now(value: T) -> Self {
        Step::Complete {
            delay: Duration::ZERO,
            value,
        }
    }

    pub fn after_ms(ms: u64, value: T) -> Self {
        Step::Complete {
            delay: Duration::from_millis(ms),
            value,
        }
    }

    async fn play(self) -> T {
        match self {
            Step::Complete { delay, value } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                value
            }
            Step::Panic => panic!("scripted gateway fault"),
        }
    }
}

/// A gateway that plays back queued completions.
///
/// With no queued submit step, submit never completes. With no queued checkout
/// step, checkout waits for a matching activity result, as the HTTP gateway does.
pub struct ScriptedGateway {
    initialized: bool,
    submit_steps: Mutex<VecDeque<Step<Result<SubmitCompletion>>>>,
    checkout_steps: Mutex<VecDeque<Step<CheckoutCompletion>>>,
    submissions: Mutex<Vec<SubmissionParams>>,
    activity_results: Mutex<Vec<ActivityResultEvent>>,
    checkouts: CheckoutWaiters,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            initialized: true,
            submit_steps: Mutex::new(VecDeque::new()),
            checkout_steps: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            activity_results: Mutex::new(Vec::new()),
            checkouts: CheckoutWaiters::default(),
        }
    }

    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            ..Self::new()
        }
    }

    pub fn push_submit(&self, step: Step<Result<SubmitCompletion>>) {
        lock(&self.submit_steps).push_back(step);
    }

    pub fn push_checkout(&self, step: Step<CheckoutCompletion>) {
        lock(&self.checkout_steps).push_back(step);
    }

    pub fn submissions(&self) -> Vec<SubmissionParams> {
        lock(&self.submissions).clone()
    }

    pub fn activity_results(&self) -> Vec<ActivityResultEvent> {
        lock(&self.activity_results).clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn submit(&self, params: SubmissionParams) -> Result<SubmitCompletion> {
        lock(&self.submissions).push(params);
        let step = lock(&self.submit_steps).pop_front();
        match step {
            Some(step) => step.play().await,
            None => std::future::pending().await,
        }
    }

    async fn checkout(
        &self,
        params: SubmissionParams,
        activity: Option<Arc<dyn ActivityContext>>,
    ) -> CheckoutCompletion {
        let step = lock(&self.checkout_steps).pop_front();
        if let Some(step) = step {
            return step.play().await;
        }
        let wait = self.checkouts.register(RequestCode::SubmitAndCheckout);
        if let Some(activity) = activity {
            activity.launch_checkout(RequestCode::SubmitAndCheckout, &params);
        }
        wait.completion().await
    }

    fn on_activity_result(&self, _activity: &dyn ActivityContext, event: ActivityResultEvent) {
        self.checkouts.complete(&event);
        lock(&self.activity_results).push(event);
    }
}

/// A host context that records checkout launches and dispatches results to its
/// registered listeners.
pub struct RecordingActivity {
    name: String,
    launches: Mutex<Vec<(RequestCode, SubmissionParams)>>,
    listeners: Mutex<Vec<Weak<dyn ActivityResultListener>>>,
}

impl RecordingActivity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            launches: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn launches(&self) -> Vec<(RequestCode, SubmissionParams)> {
        lock(&self.launches).clone()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Offers the event to each live listener until one handles it.
    pub fn dispatch(&self, event: ActivityResultEvent) -> bool {
        let listeners: Vec<_> = lock(&self.listeners)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        listeners
            .into_iter()
            .any(|listener| listener.on_activity_result(event.clone()))
    }
}

impl ActivityContext for RecordingActivity {
    fn name(&self) -> &str {
        &self.name
    }

    fn launch_checkout(&self, request_code: RequestCode, params: &SubmissionParams) {
        lock(&self.launches).push((request_code, params.clone()));
    }

    fn add_activity_result_listener(&self, listener: Weak<dyn ActivityResultListener>) {
        lock(&self.listeners).push(listener);
    }
}

/// Notification presenter that keeps everything in memory.
pub struct InMemoryPresenter {
    permission: Mutex<PermissionStatus>,
    grant_on_request: bool,
    enabled: AtomicBool,
    shown: Mutex<Vec<LocalNotification>>,
}

impl Default for InMemoryPresenter {
    fn default() -> Self {
        Self {
            permission: Mutex::new(PermissionStatus::NotDetermined),
            grant_on_request: true,
            enabled: AtomicBool::new(true),
            shown: Mutex::new(Vec::new()),
        }
    }
}

impl InMemoryPresenter {
    /// A presenter whose permission prompt is always declined.
    pub fn denying() -> Self {
        Self {
            grant_on_request: false,
            enabled: AtomicBool::new(false),
            ..Self::default()
        }
    }

    pub fn shown(&self) -> Vec<LocalNotification> {
        lock(&self.shown).clone()
    }
}

impl NotificationPresenter for InMemoryPresenter {
    fn request_permissions(&self) -> PermissionStatus {
        let mut permission = lock(&self.permission);
        if *permission == PermissionStatus::NotDetermined {
            *permission = if self.grant_on_request {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
            self.enabled.store(self.grant_on_request, Ordering::SeqCst);
        }
        *permission
    }

    fn show(&self, notification: LocalNotification) -> Result<()> {
        let mut shown = lock(&self.shown);
        shown.retain(|n| n.id != notification.id);
        shown.push(notification);
        Ok(())
    }

    fn cancel_all(&self) {
        lock(&self.shown).clear();
    }

    fn are_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_steps_play_in_order() {
        let gateway = ScriptedGateway::new();
        gateway.push_checkout(Step::now(CheckoutCompletion::completed()));
        gateway.push_checkout(Step::after_ms(1, CheckoutCompletion::failed("second")));

        assert_eq!(
            gateway.checkout(SubmissionParams::default(), None).await,
            CheckoutCompletion::completed()
        );
        assert_eq!(
            gateway.checkout(SubmissionParams::default(), None).await,
            CheckoutCompletion::failed("second")
        );
    }

    #[test]
    fn test_presenter_permission_flow() {
        let presenter = InMemoryPresenter::default();
        assert_eq!(presenter.request_permissions(), PermissionStatus::Granted);
        assert!(presenter.are_enabled());

        let denying = InMemoryPresenter::denying();
        assert!(!denying.are_enabled());
        assert_eq!(denying.request_permissions(), PermissionStatus::Denied);
        assert_eq!(denying.request_permissions(), PermissionStatus::Denied);
    }

    #[test]
    fn test_show_replaces_same_id() {
        let presenter = InMemoryPresenter::default();
        for title in ["a", "b"] {
            presenter
                .show(LocalNotification {
                    id: 1,
                    title: title.into(),
                    body: "body".into(),
                    payload: None,
                })
                .unwrap();
        }
        assert_eq!(presenter.shown().len(), 1);
        assert_eq!(presenter.shown()[0].title, "b");
        presenter.cancel_all();
        assert!(presenter.shown().is_empty());
    }
}
