//! Application layer: request correlation, the submit/checkout merge, host lifecycle
//! bridging and notification routing.
//!
//! The only shared mutable payment state is the correlator's pending-request slot,
//! and a request's outcome is only ever chosen through its resolve-once claim.

pub mod claim;
pub mod correlator;
pub mod delivery;
pub mod lifecycle;
pub mod notifications;
pub mod orchestrator;

use crate::domain::ports::PaymentGatewayRef;
use correlator::RequestCorrelator;
use lifecycle::{ActivityLifecycleBridge, ActivitySlot};
use orchestrator::PaymentSubmissionOrchestrator;
use std::sync::Arc;
use std::time::Duration;

/// Wires a gateway into a correlator and a lifecycle bridge that share one
/// activity slot. Must be called inside a tokio runtime.
pub fn assemble(
    gateway: PaymentGatewayRef,
    request_timeout: Option<Duration>,
) -> (Arc<RequestCorrelator>, Arc<ActivityLifecycleBridge>) {
    let activity = ActivitySlot::default();
    let orchestrator = PaymentSubmissionOrchestrator::new(gateway.clone(), activity.clone());
    let correlator =
        Arc::new(RequestCorrelator::new(orchestrator).with_request_timeout(request_timeout));
    let lifecycle = Arc::new(ActivityLifecycleBridge::new(
        correlator.clone(),
        gateway,
        activity,
    ));
    (correlator, lifecycle)
}
