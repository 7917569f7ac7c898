use crate::error::{ExpressPayError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://eclcommerce.ernestchemists.com.gh/api/expresspayment";

/// Gateway settings, read from an optional JSON file and overridden from the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub debug_mode: bool,
    pub http_timeout_secs: u64,
    /// Upper bound for a whole payment request; 0 disables the watchdog.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debug_mode: false,
            http_timeout_secs: 30,
            request_timeout_secs: 300,
        }
    }
}

impl GatewayConfig {
    /// Loads the config file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ExpressPayError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    ExpressPayError::Config(format!("cannot parse {}: {e}", path.display()))
                })?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            ExpressPayError::Config(format!("invalid endpoint {}: {e}", self.endpoint))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExpressPayError::Config(format!(
                "endpoint must be http(s): {}",
                self.endpoint
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(ExpressPayError::Config(
                "http_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
