use super::correlator::{PaymentOutcome, PendingRequest};
use super::lifecycle::ActivitySlot;
use crate::domain::params::SubmissionParams;
use crate::domain::ports::{CheckoutCompletion, PaymentGatewayRef, SubmitCompletion};
use crate::domain::response::PaymentResponse;
use crate::error::{ExpressPayError, Result};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

const NO_RESPONSE: &str = "No response from server";
const PAYMENT_FAILED: &str = "Payment failed";

/// Runs the gateway's submit and checkout operations side by side and merges
/// their completions into the pending request's claim.
pub struct PaymentSubmissionOrchestrator {
    gateway: PaymentGatewayRef,
    activity: ActivitySlot,
}

impl PaymentSubmissionOrchestrator {
    pub fn new(gateway: PaymentGatewayRef, activity: ActivitySlot) -> Self {
        Self { gateway, activity }
    }

    pub fn is_ready(&self) -> bool {
        self.gateway.is_initialized()
    }

    /// Starts both operations on the worker pool and returns the merge task.
    pub fn start(&self, request: Arc<PendingRequest>, params: SubmissionParams) -> JoinHandle<()> {
        let submit = {
            let gateway = self.gateway.clone();
            let params = params.clone();
            tokio::spawn(async move { gateway.submit(params).await })
        };
        let checkout = {
            let gateway = self.gateway.clone();
            let activity = self.activity.current();
            tokio::spawn(async move { gateway.checkout(params, activity).await })
        };
        tokio::spawn(merge(request, submit, checkout))
    }
}

/// Races the two completions; the first one to finish wins the claim. Whatever
/// is still outstanding once the claim resolves, from here or elsewhere, is
/// aborted.
async fn merge(
    request: Arc<PendingRequest>,
    mut submit: JoinHandle<Result<SubmitCompletion>>,
    mut checkout: JoinHandle<CheckoutCompletion>,
) {
    let outcome = tokio::select! {
        joined = &mut submit => Some(submit_outcome(joined)),
        joined = &mut checkout => Some(checkout_outcome(joined)),
        _ = request.resolved() => None,
    };

    if let Some(outcome) = outcome {
        if !request.resolve(outcome) {
            debug!(request_id = request.id(), "completion discarded, already resolved");
        }
    }
    submit.abort();
    checkout.abort();
}

fn submit_outcome(
    joined: std::result::Result<Result<SubmitCompletion>, JoinError>,
) -> PaymentOutcome {
    let completion = match joined {
        Ok(Ok(completion)) => completion,
        Ok(Err(err)) => {
            warn!(code = err.code(), error = %err, "gateway submit failed");
            return Err(err);
        }
        Err(join) => return Err(trapped("submit", join)),
    };

    if let Some(message) = completion.error_message.filter(|m| !m.is_empty()) {
        let failure = PaymentResponse::failure(message);
        return Ok(match completion.raw_response {
            Some(raw) => failure.with_fields(raw),
            None => failure,
        });
    }

    match completion.raw_response {
        Some(raw) => {
            let response = PaymentResponse::from_gateway(raw);
            if response.token.is_none() {
                debug!(success = response.success, "gateway response carries no token");
            }
            Ok(response)
        }
        None => Ok(PaymentResponse::failure(NO_RESPONSE)),
    }
}

fn checkout_outcome(
    joined: std::result::Result<CheckoutCompletion, JoinError>,
) -> PaymentOutcome {
    let completion = joined.map_err(|join| trapped("checkout", join))?;

    if let Some(message) = completion.error_message.filter(|m| !m.is_empty()) {
        return Ok(PaymentResponse::failure(message));
    }
    if completion.payment_completed {
        return Ok(PaymentResponse::completed());
    }
    Ok(PaymentResponse::failure(PAYMENT_FAILED))
}

fn trapped(operation: &str, join: JoinError) -> ExpressPayError {
    warn!(operation, error = %join, "gateway operation faulted");
    ExpressPayError::Unexpected(format!("{operation} operation faulted: {join}"))
}
