//! Configuration module for the forecast dashboard.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: forecasting API, market data, and dashboard defaults.
//! Nothing here is global: the resulting [`Config`] is passed explicitly into the
//! clients and the session.

mod api_config;
mod dashboard_config;
mod market_data_config;

pub use api_config::{ApiEnvConfig, DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS};
pub use dashboard_config::DashboardEnvConfig;
pub use market_data_config::{MarketDataEnvConfig, ProviderKind};

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiEnvConfig,
    pub market_data: MarketDataEnvConfig,
    pub dashboard: DashboardEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let api = ApiEnvConfig::from_env();
        let market_data =
            MarketDataEnvConfig::from_env().context("Failed to load market data config")?;
        let dashboard =
            DashboardEnvConfig::from_env().context("Failed to load dashboard config")?;

        Ok(Self {
            api,
            market_data,
            dashboard,
        })
    }

    /// Override the API base URL (CLI flag or dashboard text field).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_consistent() {
        let config = Config::default();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.timeout_secs, DEFAULT_API_TIMEOUT_SECS);
        assert_eq!(config.market_data.provider, ProviderKind::Yahoo);
        assert_eq!(config.dashboard.ticker, "AMZN");
    }

    #[test]
    fn test_with_api_url_overrides_base_url() {
        let config = Config::default().with_api_url("http://forecast.internal:9000");
        assert_eq!(config.api.base_url, "http://forecast.internal:9000");
    }
}
