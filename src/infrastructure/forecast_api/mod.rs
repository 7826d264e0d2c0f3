mod client;

pub use client::{ForecastApiClient, HttpMethod};
