//! Initial dashboard inputs (ticker, horizon, window) from environment variables.

use crate::domain::forecast::{Horizon, Window};
use anyhow::{Context, Result};
use std::env;

/// Dashboard defaults environment configuration
#[derive(Debug, Clone)]
pub struct DashboardEnvConfig {
    pub ticker: String,
    pub horizon: Horizon,
    pub window: Window,
}

impl Default for DashboardEnvConfig {
    fn default() -> Self {
        Self {
            ticker: "AMZN".to_string(),
            horizon: Horizon::Five,
            window: Window::default(),
        }
    }
}

impl DashboardEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let horizon = match env::var("DEFAULT_HORIZON") {
            Ok(v) => v
                .parse::<Horizon>()
                .with_context(|| format!("Invalid DEFAULT_HORIZON: {}", v))?,
            Err(_) => defaults.horizon,
        };

        let window = match env::var("DEFAULT_WINDOW") {
            Ok(v) => {
                let raw = v
                    .parse::<u32>()
                    .with_context(|| format!("Failed to parse DEFAULT_WINDOW: {}", v))?;
                Window::new(raw).context("Invalid DEFAULT_WINDOW")?
            }
            Err(_) => defaults.window,
        };

        Ok(Self {
            ticker: env::var("DEFAULT_TICKER")
                .map(|t| t.trim().to_uppercase())
                .ok()
                .filter(|t| !t.is_empty())
                .unwrap_or(defaults.ticker),
            horizon,
            window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_config_defaults() {
        let config = DashboardEnvConfig::default();
        assert_eq!(config.ticker, "AMZN");
        assert_eq!(config.horizon, Horizon::Five);
        assert_eq!(config.window.get(), 60);
    }
}
