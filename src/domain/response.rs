use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status value the gateway reports for an accepted payment.
pub const STATUS_SUCCESS: i64 = 1;

/// The single response handed back for a payment request.
///
/// `success`, `token` and `message` are lifted out of the gateway payload; every
/// other field is passed through untouched in `fields`, in arrival order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PaymentResponse {
    /// Builds a response from a raw gateway submit payload.
    ///
    /// `success` is true only when the payload's `status` field equals 1.
    pub fn from_gateway(mut raw: Map<String, Value>) -> Self {
        let success = status_of(&raw) == Some(STATUS_SUCCESS);
        raw.remove("success");
        let token = raw.remove("token").and_then(into_text);
        let message = raw.remove("message").and_then(into_text);
        Self {
            success,
            token,
            message,
            fields: raw,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        for (key, value) in fields {
            if matches!(key.as_str(), "success" | "token" | "message") {
                continue;
            }
            self.fields.entry(key).or_insert(value);
        }
        self
    }

    pub fn status(&self) -> Option<i64> {
        status_of(&self.fields)
    }
}

fn status_of(map: &Map<String, Value>) -> Option<i64> {
    match map.get("status")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn into_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
