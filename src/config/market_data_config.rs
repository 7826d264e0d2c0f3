//! Market-data provider configuration parsing from environment variables.
//!
//! Covers the provider selection plus the local history cache that sits in
//! front of it.

use anyhow::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which market-data provider backs the local-fetch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "mock" => Ok(ProviderKind::Mock),
            _ => anyhow::bail!(
                "Invalid MARKET_DATA_PROVIDER: {}. Must be 'yahoo' or 'mock'",
                s
            ),
        }
    }
}

/// Market data environment configuration
#[derive(Debug, Clone)]
pub struct MarketDataEnvConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
}

impl Default for MarketDataEnvConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Yahoo,
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 15,
            cache_ttl_secs: 300,
            cache_capacity: 8,
        }
    }
}

impl MarketDataEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let provider = match env::var("MARKET_DATA_PROVIDER") {
            Ok(v) => ProviderKind::from_str(&v)?,
            Err(_) => defaults.provider,
        };

        Ok(Self {
            provider,
            base_url: env::var("MARKET_DATA_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: positive_secs(
                env::var("MARKET_DATA_TIMEOUT_SECS").ok().as_deref(),
                defaults.timeout_secs,
            ),
            cache_ttl_secs: env::var("HISTORY_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse::<u64>()
                .unwrap_or(defaults.cache_ttl_secs),
            cache_capacity: env::var("HISTORY_CACHE_CAPACITY")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<usize>()
                .unwrap_or(defaults.cache_capacity)
                .max(1),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Zero or unparseable values fall back to `default`.
fn positive_secs(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
