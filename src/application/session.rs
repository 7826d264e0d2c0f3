//! Dashboard session: the user's current inputs, the prepared payload and the
//! calls made with it.
//!
//! A payload is prepared explicitly for the active input mode and is discarded
//! whenever the mode, ticker, window or horizon changes, so a prediction is
//! never made with stale inputs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::history_cache::{HistoryCache, HistoryKey};
use crate::application::{payload_builder, response_normalizer};
use crate::config::Config;
use crate::domain::errors::{ParameterError, UploadError};
use crate::domain::forecast::{ForecastPoint, Horizon, PredictionOutcome, PredictionRequest, Window};
use crate::domain::input_mode::InputMode;
use crate::domain::ohlcv::History;
use crate::domain::ports::{ApiCall, ForecastApi, MarketDataProvider};

/// Why no payload could be prepared.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Informational: the provider had nothing (or failed) for this ticker.
    #[error("No data available for {ticker}: {reason}")]
    NoData { ticker: String, reason: String },

    #[error("Could not read the uploaded CSV: {0}")]
    Upload(#[from] UploadError),

    #[error("Session is in {active} mode, not {requested}")]
    WrongMode {
        active: InputMode,
        requested: InputMode,
    },
}

impl PrepareError {
    /// True for "no data" results that are informational rather than failures.
    pub fn is_informational(&self) -> bool {
        matches!(self, PrepareError::NoData { .. })
    }
}

/// Request ready to be sent, with the history it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPayload {
    pub mode: InputMode,
    pub request: PredictionRequest,
    /// Absent in remote-fetch mode.
    pub history: Option<History>,
}

/// Display-ready result of a completed `/predict` call.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionReport {
    pub elapsed: Duration,
    /// Body as JSON, text bodies wrapped as `{"raw": ...}`.
    pub raw: Value,
    pub outcome: PredictionOutcome,
    pub points: Vec<ForecastPoint>,
    /// Historical closes followed by the forecast.
    pub series: Vec<(NaiveDate, f64)>,
    pub empty_body: bool,
}

impl PredictionReport {
    /// Informational message when there is nothing to tabulate.
    pub fn notice(&self) -> Option<&'static str> {
        if self.empty_body {
            Some("Empty response")
        } else if !self.outcome.is_forecast() {
            Some("Response did not match the expected shape")
        } else if self.points.is_empty() {
            Some("No predictions returned")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionView {
    /// `predict` was requested before a payload was prepared.
    PayloadRequired,
    /// Transport-level failure: message plus elapsed time.
    Failed { message: String, elapsed: Duration },
    Completed(PredictionReport),
}

pub struct DashboardSession {
    api: Arc<dyn ForecastApi>,
    provider: Arc<dyn MarketDataProvider>,
    cache: HistoryCache,
    mode: InputMode,
    ticker: String,
    window: Window,
    horizon: Horizon,
    payload: Option<PreparedPayload>,
}

impl DashboardSession {
    pub fn new(
        api: Arc<dyn ForecastApi>,
        provider: Arc<dyn MarketDataProvider>,
        cache: HistoryCache,
    ) -> Self {
        Self {
            api,
            provider,
            cache,
            mode: InputMode::default(),
            ticker: String::new(),
            window: Window::default(),
            horizon: Horizon::default(),
            payload: None,
        }
    }

    /// Session seeded with the configured defaults.
    pub fn from_config(
        config: &Config,
        api: Arc<dyn ForecastApi>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        let cache = HistoryCache::new(
            config.market_data.cache_ttl(),
            config.market_data.cache_capacity,
        );
        let mut session = Self::new(api, provider, cache);
        session.ticker = config.dashboard.ticker.clone();
        session.window = config.dashboard.window;
        session.horizon = config.dashboard.horizon;
        session
    }

    // ===== Inputs =====

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            self.mode = mode;
            self.discard_payload("mode changed");
        }
    }

    pub fn set_ticker(&mut self, ticker: &str) {
        let ticker = ticker.trim().to_string();
        if self.ticker != ticker {
            self.ticker = ticker;
            self.discard_payload("ticker changed");
            self.cache.retain_only(&self.cache_key());
        }
    }

    pub fn set_window(&mut self, window: Window) {
        if self.window != window {
            self.window = window;
            self.discard_payload("window changed");
            self.cache.retain_only(&self.cache_key());
        }
    }

    pub fn set_horizon(&mut self, horizon: Horizon) {
        if self.horizon != horizon {
            self.horizon = horizon;
            self.discard_payload("horizon changed");
        }
    }

    /// Points the session at another backend. The prepared payload stays valid.
    pub fn set_api(&mut self, api: Arc<dyn ForecastApi>) {
        self.api = api;
    }

    pub fn api_base_url(&self) -> &str {
        self.api.base_url()
    }

    pub fn payload(&self) -> Option<&PreparedPayload> {
        self.payload.as_ref()
    }

    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    fn discard_payload(&mut self, reason: &str) {
        if self.payload.take().is_some() {
            info!("DashboardSession: Discarded prepared payload ({})", reason);
        }
    }

    fn cache_key(&self) -> HistoryKey {
        HistoryKey::new(&self.ticker, self.window)
    }

    fn require_mode(&self, requested: InputMode) -> Result<(), PrepareError> {
        if self.mode == requested {
            Ok(())
        } else {
            Err(PrepareError::WrongMode {
                active: self.mode,
                requested,
            })
        }
    }

    fn require_ticker(&self) -> Result<(), PrepareError> {
        if self.ticker.is_empty() {
            return Err(ParameterError::MissingTicker {
                mode: self.mode.to_string(),
            }
            .into());
        }
        Ok(())
    }

    // ===== Payload preparation =====

    /// Remote fetch: the request carries only ticker, window and horizon.
    pub fn prepare_remote(&mut self) -> Result<&PreparedPayload, PrepareError> {
        self.require_mode(InputMode::RemoteFetch)?;
        self.payload = None;
        self.require_ticker()?;

        let request = payload_builder::remote(&self.ticker, self.window, self.horizon);
        Ok(&*self.payload.insert(PreparedPayload {
            mode: InputMode::RemoteFetch,
            request,
            history: None,
        }))
    }

    /// Local fetch: downloads the trailing history through the market-data
    /// provider (or reuses a cached copy) and keeps the last `window` rows.
    pub async fn prepare_local(&mut self) -> Result<&PreparedPayload, PrepareError> {
        self.prepare_local_at(Local::now().date_naive()).await
    }

    pub async fn prepare_local_at(
        &mut self,
        today: NaiveDate,
    ) -> Result<&PreparedPayload, PrepareError> {
        self.require_mode(InputMode::LocalFetch)?;
        self.payload = None;
        self.require_ticker()?;

        let history = self.local_history(today).await?;
        let request = payload_builder::build(
            &history,
            self.window,
            self.horizon,
            Some(self.ticker.as_str()),
        );
        info!(
            "DashboardSession: Prepared local payload for {} ({} of {} rows)",
            self.ticker,
            request.history_len(),
            history.len()
        );

        Ok(&*self.payload.insert(PreparedPayload {
            mode: InputMode::LocalFetch,
            request,
            history: Some(history),
        }))
    }

    async fn local_history(&self, today: NaiveDate) -> Result<History, PrepareError> {
        let key = self.cache_key();
        if let Some(history) = self.cache.get(&key) {
            info!("DashboardSession: Using cached history for {}", self.ticker);
            return Ok(history);
        }

        let start = today - ChronoDuration::days(self.window.lookback_days());
        let end = today + ChronoDuration::days(1);

        let history = self
            .provider
            .fetch_daily_history(&self.ticker, start, end)
            .await
            .map_err(|e| {
                warn!(
                    "DashboardSession: {} fetch failed for {}: {}",
                    self.provider.name(),
                    self.ticker,
                    e
                );
                PrepareError::NoData {
                    ticker: self.ticker.clone(),
                    reason: e.to_string(),
                }
            })?;

        if history.is_empty() {
            return Err(PrepareError::NoData {
                ticker: self.ticker.clone(),
                reason: format!("{} returned no rows", self.provider.name()),
            });
        }

        self.cache.insert(key, history.clone());
        Ok(history)
    }

    /// Upload: takes the result of importing the CSV. A rejected file leaves
    /// no payload behind.
    pub fn prepare_upload(
        &mut self,
        upload: Result<History, UploadError>,
    ) -> Result<&PreparedPayload, PrepareError> {
        self.require_mode(InputMode::Upload)?;
        self.payload = None;

        let history = upload?;
        let ticker = (!self.ticker.is_empty()).then_some(self.ticker.as_str());
        let request = payload_builder::build(&history, self.window, self.horizon, ticker);
        info!(
            "DashboardSession: Prepared upload payload ({} of {} rows)",
            request.history_len(),
            history.len()
        );

        Ok(&*self.payload.insert(PreparedPayload {
            mode: InputMode::Upload,
            request,
            history: Some(history),
        }))
    }

    // ===== API calls =====

    pub async fn check_health(&self) -> ApiCall {
        self.api.health().await
    }

    pub async fn fetch_metadata(&self) -> ApiCall {
        self.api.metadata().await
    }

    /// Sends the prepared payload to `/predict`.
    pub async fn predict(&self) -> PredictionView {
        self.predict_at(Local::now().date_naive()).await
    }

    pub async fn predict_at(&self, today: NaiveDate) -> PredictionView {
        let Some(payload) = &self.payload else {
            return PredictionView::PayloadRequired;
        };

        let call = self.api.predict(&payload.request).await;
        let elapsed = call.elapsed;
        let body = match call.outcome {
            Ok(body) => body,
            Err(e) => {
                return PredictionView::Failed {
                    message: e.to_string(),
                    elapsed,
                };
            }
        };

        let empty_body = body.is_empty();
        let raw = body.to_json();
        let outcome = body.into_prediction_outcome();

        let history = payload.history.as_ref();
        let last_known = history.and_then(History::last_date);
        let points = response_normalizer::normalize_at(&outcome, last_known, today);
        let series = response_normalizer::combined_close_series(
            history,
            &points,
            response_normalizer::CHART_HISTORY_TAIL,
        );

        PredictionView::Completed(PredictionReport {
            elapsed,
            raw,
            outcome,
            points,
            series,
            empty_body,
        })
    }
}
