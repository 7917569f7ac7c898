use super::{MethodCall, MethodError, MethodResult};
use crate::application::correlator::RequestCorrelator;
use crate::domain::params::SubmissionParams;
use crate::domain::response::PaymentResponse;
use crate::error::{ExpressPayError, Result};
use std::sync::Arc;
use tracing::debug;

pub const CHANNEL_NAME: &str = "com.yourcompany.expresspay";
pub const START_EXPRESS_PAY: &str = "startExpressPay";

/// The payment side of the call boundary: `startExpressPay`.
pub struct PaymentChannel {
    correlator: Arc<RequestCorrelator>,
}

impl PaymentChannel {
    pub fn new(correlator: Arc<RequestCorrelator>) -> Self {
        Self { correlator }
    }

    pub async fn handle(&self, call: MethodCall) -> MethodResult {
        debug!(channel = CHANNEL_NAME, method = %call.method, "method call");
        match call.method.as_str() {
            START_EXPRESS_PAY => {
                let response = self.start_express_pay(&call.arguments).await?;
                serde_json::to_value(response)
                    .map_err(|e| MethodError::from(ExpressPayError::Unexpected(e.to_string())))
            }
            other => Err(MethodError::not_implemented(other)),
        }
    }

    /// Runs one payment end to end and returns its single response. An
    /// unavailable gateway is reported before the arguments are looked at.
    pub async fn start_express_pay(
        &self,
        arguments: &serde_json::Value,
    ) -> Result<PaymentResponse> {
        self.correlator.ensure_ready()?;
        let params = SubmissionParams::from_arguments(arguments)?;
        self.correlator.submit(params)?.response().await
    }
}
