use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpressPayError {
    #[error("ExpressPay API not initialized: {0}")]
    NotInitialized(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("A payment is already in progress")]
    AlreadyRunning,
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed gateway payload: {0}")]
    Parse(String),
    #[error("payment request timed out after {0:?}")]
    Timeout(Duration),
    #[error("notification listener unavailable: {0}")]
    ListenerUnavailable(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ExpressPayError {
    /// Wire code reported across the call boundary.
    pub fn code(&self) -> &'static str {
        match self {
            ExpressPayError::NotInitialized(_) => "NOT_INITIALIZED",
            ExpressPayError::InvalidParams(_) => "INVALID_PARAMS",
            ExpressPayError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            ExpressPayError::AlreadyRunning => "ALREADY_RUNNING",
            ExpressPayError::Transport(_) => "API_ERROR",
            ExpressPayError::Parse(_) => "PARSE_ERROR",
            ExpressPayError::Timeout(_) => "TIMEOUT",
            ExpressPayError::ListenerUnavailable(_) => "LISTENER_UNAVAILABLE",
            ExpressPayError::Config(_) => "CONFIG_ERROR",
            ExpressPayError::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }
}

impl From<serde_json::Error> for ExpressPayError {
    fn from(err: serde_json::Error) -> Self {
        ExpressPayError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExpressPayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_map_to_parse_code() {
        let err: ExpressPayError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn test_already_running_message() {
        let err = ExpressPayError::AlreadyRunning;
        assert_eq!(err.code(), "ALREADY_RUNNING");
        assert_eq!(err.to_string(), "A payment is already in progress");
    }
}
