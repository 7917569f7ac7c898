use super::claim::ResultClaim;
use super::delivery::DeliveryContext;
use super::orchestrator::PaymentSubmissionOrchestrator;
use crate::domain::params::SubmissionParams;
use crate::domain::request::RequestCode;
use crate::domain::response::PaymentResponse;
use crate::error::{ExpressPayError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub type PaymentOutcome = Result<PaymentResponse>;

type Slot = Arc<Mutex<Option<Arc<PendingRequest>>>>;

/// The one in-flight payment request.
pub struct PendingRequest {
    id: u64,
    request_code: RequestCode,
    submitted_at: DateTime<Utc>,
    claim: ResultClaim<PaymentOutcome>,
}

impl PendingRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request_code(&self) -> RequestCode {
        self.request_code
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Offers an outcome for this request. Only the first offer is delivered.
    pub fn resolve(&self, outcome: PaymentOutcome) -> bool {
        let won = self.claim.resolve(outcome);
        if won {
            debug!(request_id = self.id, "payment request resolved");
        }
        won
    }

    pub fn is_resolved(&self) -> bool {
        self.claim.is_resolved()
    }

    pub async fn resolved(&self) {
        self.claim.resolved().await
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("request_code", &self.request_code)
            .field("submitted_at", &self.submitted_at)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Caller-side handle for an accepted request.
#[derive(Debug)]
pub struct PaymentHandle {
    request_id: u64,
    receiver: oneshot::Receiver<PaymentOutcome>,
}

impl PaymentHandle {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Waits for the request's single outcome.
    pub async fn response(self) -> Result<PaymentResponse> {
        self.receiver.await.map_err(|_| {
            ExpressPayError::Unexpected("payment request dropped without a response".to_string())
        })?
    }
}

/// Single-flight owner of the pending payment request.
///
/// At most one [`PendingRequest`] exists at a time. The slot is freed by the
/// request's claim the moment it resolves, before the caller sees the outcome, so
/// a caller may submit again as soon as its previous response arrives.
pub struct RequestCorrelator {
    orchestrator: PaymentSubmissionOrchestrator,
    slot: Slot,
    delivery: DeliveryContext,
    request_timeout: Option<Duration>,
    next_id: AtomicU64,
}

impl RequestCorrelator {
    /// Creates a correlator with its own delivery context. Must be called inside a
    /// tokio runtime.
    pub fn new(orchestrator: PaymentSubmissionOrchestrator) -> Self {
        Self {
            orchestrator,
            slot: Arc::new(Mutex::new(None)),
            delivery: DeliveryContext::spawn(),
            request_timeout: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Arms a watchdog per request. `None` leaves requests unbounded.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Fails with `NotInitialized` while the gateway is unavailable.
    pub fn ensure_ready(&self) -> Result<()> {
        if self.orchestrator.is_ready() {
            Ok(())
        } else {
            Err(ExpressPayError::NotInitialized(
                "payment gateway is not available".to_string(),
            ))
        }
    }

    /// Accepts a payment request, or rejects it straight away.
    ///
    /// Fails with `NotInitialized` if the gateway is unavailable, `InvalidParams`
    /// if the params fail validation and `AlreadyRunning` if another request is
    /// pending. A rejection leaves any pending request untouched.
    pub fn submit(&self, params: SubmissionParams) -> Result<PaymentHandle> {
        self.ensure_ready()?;
        params.validate()?;

        let (request, receiver) = {
            let mut slot = lock(&self.slot);
            if let Some(active) = slot.as_ref() {
                warn!(active_request = active.id, "rejecting payment: request already in flight");
                return Err(ExpressPayError::AlreadyRunning);
            }

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let release_slot = Arc::downgrade(&self.slot);
            let (claim, receiver) = ResultClaim::with_release(self.delivery.clone(), move || {
                if let Some(release_slot) = release_slot.upgrade() {
                    let mut slot = lock(&release_slot);
                    if slot.as_ref().is_some_and(|r| r.id == id) {
                        *slot = None;
                    }
                }
            });
            let request = Arc::new(PendingRequest {
                id,
                request_code: RequestCode::SubmitAndCheckout,
                submitted_at: Utc::now(),
                claim,
            });
            *slot = Some(request.clone());
            (request, receiver)
        };

        info!(
            request_id = request.id,
            request_code = %request.request_code,
            order_id = params.order_id.as_deref().unwrap_or_default(),
            "payment request accepted"
        );

        if let Some(limit) = self.request_timeout {
            arm_watchdog(request.clone(), limit);
        }
        self.orchestrator.start(request.clone(), params);

        Ok(PaymentHandle {
            request_id: request.id,
            receiver,
        })
    }

    pub fn current_request(&self) -> Option<Arc<PendingRequest>> {
        lock(&self.slot).clone()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Resolves the pending request, if any, as cancelled.
    pub fn cancel_current(&self) -> bool {
        match self.current_request() {
            Some(request) => request.resolve(Ok(PaymentResponse::failure("Payment cancelled"))),
            None => false,
        }
    }
}

fn arm_watchdog(request: Arc<PendingRequest>, limit: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(limit) => {
                if request.resolve(Err(ExpressPayError::Timeout(limit))) {
                    warn!(
                        request_id = request.id,
                        submitted_at = %request.submitted_at(),
                        ?limit,
                        "payment request timed out"
                    );
                }
            }
            _ = request.resolved() => {}
        }
    });
}

fn lock(slot: &Mutex<Option<Arc<PendingRequest>>>) -> MutexGuard<'_, Option<Arc<PendingRequest>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::ActivitySlot;
    use crate::infrastructure::in_memory::{ScriptedGateway, Step};
    use serde_json::json;

    fn params() -> SubmissionParams {
        SubmissionParams {
            currency: Some("GHS".into()),
            amount: Some("10.00".into()),
            order_id: Some("123".into()),
            ..Default::default()
        }
    }

    fn correlator(gateway: Arc<ScriptedGateway>) -> RequestCorrelator {
        RequestCorrelator::new(PaymentSubmissionOrchestrator::new(
            gateway,
            ActivitySlot::default(),
        ))
    }

    #[tokio::test]
    async fn test_uninitialized_gateway_rejects_without_pending_request() {
        let gateway = Arc::new(ScriptedGateway::uninitialized());
        let correlator = correlator(gateway.clone());

        let err = correlator.submit(params()).unwrap_err();
        assert_eq!(err.code(), "NOT_INITIALIZED");
        assert!(!correlator.is_busy());
        assert!(gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_params_rejected() {
        let correlator = correlator(Arc::new(ScriptedGateway::new()));
        let err = correlator.submit(SubmissionParams::default()).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
        assert!(!correlator.is_busy());
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_pending() {
        let gateway = Arc::new(ScriptedGateway::new());
        let correlator = correlator(gateway);

        let handle = correlator.submit(params()).unwrap();
        let active = correlator.current_request().unwrap();

        let err = correlator.submit(params()).unwrap_err();
        assert!(matches!(err, ExpressPayError::AlreadyRunning));
        let still_active = correlator.current_request().unwrap();
        assert_eq!(still_active.id(), handle.request_id());
        assert_eq!(active.id(), still_active.id());
        assert!(!still_active.is_resolved());
    }

    #[tokio::test]
    async fn test_slot_freed_before_response_is_observed() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_submit(Step::after_ms(
            5,
            Ok(crate::domain::ports::SubmitCompletion::response(
                json!({"status": 1, "token": "abc"}).as_object().unwrap().clone(),
            )),
        ));
        let correlator = correlator(gateway);

        let response = correlator.submit(params()).unwrap().response().await.unwrap();
        assert!(response.success);
        assert!(!correlator.is_busy());
        assert!(correlator.submit(params()).is_ok());
    }

    #[tokio::test]
    async fn test_cancel_current_resolves_and_frees_slot() {
        let correlator = correlator(Arc::new(ScriptedGateway::new()));
        let handle = correlator.submit(params()).unwrap();

        assert!(correlator.cancel_current());
        assert!(!correlator.is_busy());
        let response = handle.response().await.unwrap();
        assert_eq!(response, PaymentResponse::failure("Payment cancelled"));
        assert!(!correlator.cancel_current());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_times_out_stuck_request() {
        let correlator = correlator(Arc::new(ScriptedGateway::new()))
            .with_request_timeout(Some(Duration::from_secs(300)));
        let handle = correlator.submit(params()).unwrap();

        let request = correlator.current_request().unwrap();
        assert!(request.submitted_at() <= Utc::now());

        let err = handle.response().await.unwrap_err();
        assert_eq!(err.code(), "TIMEOUT");
        assert!(!correlator.is_busy());
    }
}
