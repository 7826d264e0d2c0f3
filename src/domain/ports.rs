use crate::domain::errors::{ApiError, MarketDataError};
use crate::domain::forecast::{PredictionOutcome, PredictionRequest};
use crate::domain::ohlcv::History;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;

/// Source of daily OHLCV bars for a ticker.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars with `start <= date < end`, oldest first.
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<History, MarketDataError>;

    fn name(&self) -> &'static str;
}

/// Decoded body of a successful API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// The body was not valid JSON.
    Text(String),
}

impl ResponseBody {
    /// JSON view for display; raw text is wrapped as `{"raw": text}`.
    pub fn to_json(&self) -> Value {
        match self {
            ResponseBody::Json(v) => v.clone(),
            ResponseBody::Text(t) => serde_json::json!({ "raw": t }),
        }
    }

    /// `null`, `{}` and `[]` count as empty, as does blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            ResponseBody::Json(Value::Null) => true,
            ResponseBody::Json(Value::Object(m)) => m.is_empty(),
            ResponseBody::Json(Value::Array(a)) => a.is_empty(),
            ResponseBody::Json(_) => false,
            ResponseBody::Text(t) => t.trim().is_empty(),
        }
    }

    /// Classifies a `/predict` body against the documented response shape.
    pub fn into_prediction_outcome(self) -> PredictionOutcome {
        match self {
            ResponseBody::Json(v) => PredictionOutcome::from_value(v),
            text @ ResponseBody::Text(_) => PredictionOutcome::Unrecognized(text.to_json()),
        }
    }
}

/// Result of a single API call: elapsed time is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub elapsed: Duration,
    pub outcome: Result<ResponseBody, ApiError>,
}

impl ApiCall {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        self.outcome.as_ref().ok()
    }

    /// Human-readable error message, if the call failed.
    pub fn error_message(&self) -> Option<String> {
        self.outcome.as_ref().err().map(ToString::to_string)
    }
}

/// The three endpoints of the forecasting backend.
#[async_trait]
pub trait ForecastApi: Send + Sync {
    async fn health(&self) -> ApiCall;
    async fn metadata(&self) -> ApiCall;
    async fn predict(&self, request: &PredictionRequest) -> ApiCall;
    fn base_url(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_body_wrapped_as_raw() {
        let body = ResponseBody::Text("<html>ok</html>".to_string());
        assert_eq!(body.to_json(), json!({"raw": "<html>ok</html>"}));
        assert!(!body.is_empty());
        assert!(!body.into_prediction_outcome().is_forecast());
    }

    #[test]
    fn test_empty_bodies() {
        assert!(ResponseBody::Json(json!({})).is_empty());
        assert!(ResponseBody::Json(Value::Null).is_empty());
        assert!(ResponseBody::Text("  ".to_string()).is_empty());
        assert!(!ResponseBody::Json(json!({"status": "ok"})).is_empty());
    }

    #[test]
    fn test_api_call_accessors() {
        let failed = ApiCall {
            elapsed: Duration::from_millis(250),
            outcome: Err(ApiError::Connection {
                reason: "connection refused".to_string(),
            }),
        };
        assert!(failed.body().is_none());
        assert_eq!(failed.elapsed_secs(), 0.25);
        assert!(failed.error_message().unwrap().contains("connection refused"));
    }
}
