// Request assembly
pub mod payload_builder;

// Forecast response to dated series
pub mod response_normalizer;

// Local-fetch history cache
pub mod history_cache;

// User session orchestrating the three input modes
pub mod session;

// UI-facing command/event channel and the background worker behind it
pub mod client;
pub mod worker;
