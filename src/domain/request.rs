use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Host request codes under which the gateway launches its checkout screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestCode {
    SubmitAndCheckout,
    Checkout,
    CheckoutWithToken,
}

impl RequestCode {
    pub const fn code(self) -> i32 {
        match self {
            RequestCode::SubmitAndCheckout => 1001,
            RequestCode::Checkout => 1002,
            RequestCode::CheckoutWithToken => 1003,
        }
    }
}

impl TryFrom<i32> for RequestCode {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1001 => Ok(RequestCode::SubmitAndCheckout),
            1002 => Ok(RequestCode::Checkout),
            1003 => Ok(RequestCode::CheckoutWithToken),
            other => Err(other),
        }
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A result the host delivers when a launched screen finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResultEvent {
    pub request_code: i32,
    pub result_code: i32,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ActivityResultEvent {
    pub const RESULT_OK: i32 = -1;
    pub const RESULT_CANCELED: i32 = 0;

    pub fn new(request_code: i32, result_code: i32) -> Self {
        Self {
            request_code,
            result_code,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// A `message` string carried in the event data, if any.
    pub fn message(&self) -> Option<&str> {
        self.data.as_ref()?.get("message")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_code_conversion() {
        for code in [
            RequestCode::SubmitAndCheckout,
            RequestCode::Checkout,
            RequestCode::CheckoutWithToken,
        ] {
            assert_eq!(RequestCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(RequestCode::try_from(42), Err(42));
    }

    #[test]
    fn test_event_message() {
        let event = ActivityResultEvent::new(1001, 0).with_data(json!({"message": "declined"}));
        assert_eq!(event.message(), Some("declined"));
        assert_eq!(ActivityResultEvent::new(1001, 0).message(), None);
    }
}
