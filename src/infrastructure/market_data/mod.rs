//! Market-data providers backing the local-fetch mode.

mod mock;
mod yahoo;

pub use mock::MockMarketDataProvider;
pub use yahoo::YahooMarketDataProvider;

use crate::config::{MarketDataEnvConfig, ProviderKind};
use crate::domain::ports::MarketDataProvider;
use std::sync::Arc;

/// Builds the provider selected in the configuration.
pub fn create_provider(config: &MarketDataEnvConfig) -> Arc<dyn MarketDataProvider> {
    match config.provider {
        ProviderKind::Yahoo => Arc::new(YahooMarketDataProvider::new(
            config.base_url.clone(),
            config.timeout(),
        )),
        ProviderKind::Mock => Arc::new(MockMarketDataProvider::new()),
    }
}
