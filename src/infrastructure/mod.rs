pub mod csv_import;
pub mod forecast_api;
pub mod http_client_factory;
pub mod market_data;

pub use forecast_api::ForecastApiClient;
pub use market_data::{MockMarketDataProvider, YahooMarketDataProvider, create_provider};
