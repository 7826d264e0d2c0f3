//! Wire types for the forecasting API and the display-ready forecast series.
//!
//! The response shape (`predictions`, `last_date`, `horizon`) follows the
//! backend's suggested schema, which is still unconfirmed against a deployed
//! service. Bodies that do not match it become
//! [`PredictionOutcome::Unrecognized`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::ParameterError;

/// Number of future steps the forecast covers. The backend only serves 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum Horizon {
    One,
    #[default]
    Five,
}

impl Horizon {
    pub const ALL: [Horizon; 2] = [Horizon::One, Horizon::Five];

    pub fn steps(self) -> u32 {
        match self {
            Horizon::One => 1,
            Horizon::Five => 5,
        }
    }
}

impl TryFrom<u32> for Horizon {
    type Error = ParameterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Horizon::One),
            5 => Ok(Horizon::Five),
            _ => Err(ParameterError::InvalidHorizon { value }),
        }
    }
}

impl From<Horizon> for u32 {
    fn from(h: Horizon) -> Self {
        h.steps()
    }
}

impl FromStr for Horizon {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ParameterError::InvalidHorizon { value: 0 })?;
        Horizon::try_from(value)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps())
    }
}

/// Number of most-recent observations used as model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Window(u32);

impl Window {
    pub const MIN: u32 = 30;
    pub const MAX: u32 = 180;
    pub const STEP: u32 = 5;
    pub const DEFAULT: u32 = 60;

    pub fn new(value: u32) -> Result<Self, ParameterError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ParameterError::InvalidWindow {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Trailing calendar range to request from a market-data provider so that
    /// at least `window` trading days come back.
    pub fn lookback_days(self) -> i64 {
        (i64::from(self.0) * 3).max(180)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u32> for Window {
    type Error = ParameterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Window::new(value)
    }
}

impl From<Window> for u32 {
    fn from(w: Window) -> Self {
        w.0
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One history row as the backend expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Body of `POST /predict`.
///
/// When the backend sources the history itself, `history` is omitted and only
/// `ticker`, `window` and `horizon` are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub horizon: Horizon,
    pub window: Window,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryPoint>>,
}

impl PredictionRequest {
    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, Vec::len)
    }

    /// Pretty JSON for display, cut to `max_chars`.
    pub fn preview(&self, max_chars: usize) -> String {
        let json = serde_json::to_string_pretty(self).unwrap_or_default();
        match json.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}\n…", &json[..idx]),
            None => json,
        }
    }
}

/// Well-formed body of a `/predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<f64>,
    /// Final known observation, as sent by the backend. Parsed lazily so a
    /// malformed value never invalidates the predictions themselves.
    #[serde(default)]
    pub last_date: Option<String>,
    #[serde(default)]
    pub horizon: Option<u32>,
}

/// Classified `/predict` body.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Forecast(PredictionResponse),
    /// The body did not match the documented shape; kept for display.
    Unrecognized(Value),
}

impl PredictionOutcome {
    pub fn from_value(value: Value) -> Self {
        if !value.get("predictions").is_some_and(Value::is_array) {
            return PredictionOutcome::Unrecognized(value);
        }

        // `last_date` may be any JSON type; only a string is meaningful.
        let last_date = value
            .get("last_date")
            .and_then(Value::as_str)
            .map(str::to_string);
        let horizon = value
            .get("horizon")
            .and_then(Value::as_u64)
            .and_then(|h| u32::try_from(h).ok());

        let predictions: Option<Vec<f64>> = value
            .get("predictions")
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(Value::as_f64).collect());

        match predictions {
            Some(predictions) => PredictionOutcome::Forecast(PredictionResponse {
                predictions,
                last_date,
                horizon,
            }),
            None => PredictionOutcome::Unrecognized(value),
        }
    }

    pub fn predictions(&self) -> &[f64] {
        match self {
            PredictionOutcome::Forecast(resp) => &resp.predictions,
            PredictionOutcome::Unrecognized(_) => &[],
        }
    }

    pub fn last_date(&self) -> Option<&str> {
        match self {
            PredictionOutcome::Forecast(resp) => resp.last_date.as_deref(),
            PredictionOutcome::Unrecognized(_) => None,
        }
    }

    pub fn is_forecast(&self) -> bool {
        matches!(self, PredictionOutcome::Forecast(_))
    }
}

/// One row of the forecast table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_horizon_only_accepts_one_and_five() {
        assert_eq!(Horizon::try_from(1).unwrap(), Horizon::One);
        assert_eq!(Horizon::try_from(5).unwrap(), Horizon::Five);
        assert!(Horizon::try_from(3).is_err());
        assert!(Horizon::try_from(0).is_err());
        assert!("x".parse::<Horizon>().is_err());
        assert_eq!(" 5 ".parse::<Horizon>().unwrap(), Horizon::Five);
    }

    #[test]
    fn test_window_bounds() {
        assert!(Window::new(29).is_err());
        assert!(Window::new(181).is_err());
        assert_eq!(Window::new(30).unwrap().get(), 30);
        assert_eq!(Window::new(180).unwrap().get(), 180);
        assert_eq!(Window::default().get(), 60);
    }

    #[test]
    fn test_window_lookback_days() {
        assert_eq!(Window::new(30).unwrap().lookback_days(), 180);
        assert_eq!(Window::new(60).unwrap().lookback_days(), 180);
        assert_eq!(Window::new(100).unwrap().lookback_days(), 300);
    }

    #[test]
    fn test_remote_request_omits_history() {
        let req = PredictionRequest {
            horizon: Horizon::Five,
            window: Window::default(),
            ticker: Some("AMZN".to_string()),
            history: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"horizon": 5, "window": 60, "ticker": "AMZN"}));
    }

    #[test]
    fn test_request_rejects_invalid_horizon_on_deserialize() {
        let res: Result<PredictionRequest, _> =
            serde_json::from_value(json!({"horizon": 2, "window": 60}));
        assert!(res.is_err());
    }

    #[test]
    fn test_outcome_classifies_documented_shape() {
        let outcome = PredictionOutcome::from_value(json!({
            "predictions": [101.5, 102.0],
            "horizon": 5,
            "last_date": "2024-01-05"
        }));
        assert!(outcome.is_forecast());
        assert_eq!(outcome.predictions(), &[101.5, 102.0]);
        assert_eq!(outcome.last_date(), Some("2024-01-05"));
    }

    #[test]
    fn test_outcome_keeps_unexpected_payloads() {
        let raw = json!({"forecast": [1.0, 2.0]});
        let outcome = PredictionOutcome::from_value(raw.clone());
        assert_eq!(outcome, PredictionOutcome::Unrecognized(raw));
        assert!(outcome.predictions().is_empty());

        let non_numeric = PredictionOutcome::from_value(json!({"predictions": ["a"]}));
        assert!(!non_numeric.is_forecast());

        let not_a_list = PredictionOutcome::from_value(json!({"predictions": 3.0}));
        assert!(!not_a_list.is_forecast());
    }

    #[test]
    fn test_outcome_ignores_non_string_last_date() {
        let outcome = PredictionOutcome::from_value(json!({
            "predictions": [1.0],
            "last_date": 20240105
        }));
        assert!(outcome.is_forecast());
        assert_eq!(outcome.last_date(), None);
    }

    #[test]
    fn test_preview_truncates() {
        let req = PredictionRequest {
            horizon: Horizon::One,
            window: Window::default(),
            ticker: None,
            history: None,
        };
        let preview = req.preview(10);
        assert!(preview.ends_with('…'));
        assert!(req.preview(10_000).contains("\"window\": 60"));
    }
}
