// Forecast request/response domain
pub mod forecast;

// History source selection
pub mod input_mode;

// OHLCV observations
pub mod ohlcv;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
