use crate::error::{ExpressPayError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Parameters forwarded to the payment gateway for a single payment.
///
/// Every field is optional on the wire; [`SubmissionParams::validate`] enforces the
/// subset the gateway needs before a request is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl SubmissionParams {
    /// Builds params from a call's raw argument value.
    ///
    /// The value must be a JSON object. Recognised keys must hold strings; unknown
    /// keys are ignored.
    pub fn from_arguments(arguments: &Value) -> Result<Self> {
        let map = arguments.as_object().ok_or_else(|| {
            ExpressPayError::InvalidParams("Params are null or invalid".to_string())
        })?;

        let mut params = SubmissionParams::default();
        let slots: [(&str, &mut Option<String>); 11] = [
            ("currency", &mut params.currency),
            ("amount", &mut params.amount),
            ("order_id", &mut params.order_id),
            ("order_desc", &mut params.order_desc),
            ("account_number", &mut params.account_number),
            ("email", &mut params.email),
            ("redirect_url", &mut params.redirect_url),
            ("order_img_url", &mut params.order_img_url),
            ("first_name", &mut params.first_name),
            ("last_name", &mut params.last_name),
            ("phone_number", &mut params.phone_number),
        ];
        for (key, slot) in slots {
            match map.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => *slot = Some(s.clone()),
                Some(other) => {
                    return Err(ExpressPayError::InvalidParams(format!(
                        "{key} must be a string, got {other}"
                    )));
                }
            }
        }
        Ok(params)
    }

    /// Checks that currency, amount and order id are present, and that the amount
    /// is a positive decimal.
    pub fn validate(&self) -> Result<()> {
        require("currency", &self.currency)?;
        require("order_id", &self.order_id)?;
        let amount = require("amount", &self.amount)?;
        let parsed = Decimal::from_str(amount.trim()).map_err(|_| {
            ExpressPayError::InvalidParams(format!("amount is not a decimal: {amount}"))
        })?;
        if parsed <= Decimal::ZERO {
            return Err(ExpressPayError::InvalidParams(
                "amount must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
            .as_deref()
            .and_then(|a| Decimal::from_str(a.trim()).ok())
    }
}

fn require<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ExpressPayError::InvalidParams(format!("{name} is required"))),
    }
}
