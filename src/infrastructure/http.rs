use super::checkout::CheckoutWaiters;
use crate::config::GatewayConfig;
use crate::domain::params::SubmissionParams;
use crate::domain::ports::{ActivityContext, CheckoutCompletion, PaymentGateway, SubmitCompletion};
use crate::domain::request::{ActivityResultEvent, RequestCode};
use crate::error::{ExpressPayError, Result};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const API_CALL_FAILED: &str = "API call failed";

/// Payment gateway reached over HTTPS.
///
/// Submission is a JSON POST against the configured endpoint. Checkout is handed to
/// the attached host activity and completes when its activity result comes back.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    endpoint: Url,
    debug_mode: bool,
    checkouts: CheckoutWaiters,
}

impl HttpPaymentGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ExpressPayError::NotInitialized(e.to_string()))?;
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ExpressPayError::NotInitialized(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| ExpressPayError::NotInitialized(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            debug_mode: config.debug_mode,
            checkouts: CheckoutWaiters::default(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post_submission(&self, params: &SubmissionParams) -> Result<SubmitCompletion> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .json(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "gateway rejected submission");
            let mut raw = Map::new();
            raw.insert("status_code".to_string(), json!(status.as_u16()));
            raw.insert(
                "body".to_string(),
                Value::String(String::from_utf8_lossy(&body).into_owned()),
            );
            return Ok(SubmitCompletion {
                raw_response: Some(raw),
                error_message: Some(API_CALL_FAILED.to_string()),
            });
        }

        match serde_json::from_slice::<Value>(&body)? {
            Value::Object(raw) => {
                if self.debug_mode {
                    let dump = Value::Object(raw.clone());
                    debug!(response = %dump, "gateway submit response");
                }
                Ok(SubmitCompletion::response(raw))
            }
            other => Err(ExpressPayError::Parse(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    fn is_initialized(&self) -> bool {
        true
    }

    async fn submit(&self, params: SubmissionParams) -> Result<SubmitCompletion> {
        debug!(endpoint = %self.endpoint, "submitting payment");
        self.post_submission(&params).await
    }

    async fn checkout(
        &self,
        params: SubmissionParams,
        activity: Option<Arc<dyn ActivityContext>>,
    ) -> CheckoutCompletion {
        let wait = self.checkouts.register(RequestCode::SubmitAndCheckout);
        match activity {
            Some(activity) => {
                info!(activity = activity.name(), "launching checkout");
                activity.launch_checkout(RequestCode::SubmitAndCheckout, &params);
            }
            None => debug!("no attached activity, checkout launch deferred"),
        }
        wait.completion().await
    }

    fn on_activity_result(&self, _activity: &dyn ActivityContext, event: ActivityResultEvent) {
        if !self.checkouts.complete(&event) {
            debug!(request_code = event.request_code, "no checkout waiting for activity result");
        }
    }
}
