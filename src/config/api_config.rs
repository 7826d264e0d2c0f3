//! Forecasting API configuration parsing from environment variables.

use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 15;

/// Forecasting API configuration
#[derive(Debug, Clone)]
pub struct ApiEnvConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiEnvConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl ApiEnvConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("API_BASE_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            timeout_secs: env::var("API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_API_TIMEOUT_SECS),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
