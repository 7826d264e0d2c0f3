//! Turns an OHLCV history into the body of `POST /predict`.
//!
//! The builder trusts its input: it does not check price plausibility
//! (`low <= close <= high`) and never pads a short history.

use crate::domain::forecast::{Horizon, HistoryPoint, PredictionRequest, Window};
use crate::domain::ohlcv::{History, OhlcvRecord};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request carrying the last `window` records of `history` (all of them when
/// the history is shorter).
pub fn build(
    history: &History,
    window: Window,
    horizon: Horizon,
    ticker: Option<&str>,
) -> PredictionRequest {
    let records: Vec<HistoryPoint> = history
        .tail(window.as_usize())
        .iter()
        .map(to_history_point)
        .collect();

    PredictionRequest {
        horizon,
        window,
        ticker: normalize_ticker(ticker),
        history: Some(records),
    }
}

/// Request for the remote-fetch mode: the backend sources the history itself.
pub fn remote(ticker: &str, window: Window, horizon: Horizon) -> PredictionRequest {
    PredictionRequest {
        horizon,
        window,
        ticker: normalize_ticker(Some(ticker)),
        history: None,
    }
}

fn to_history_point(record: &OhlcvRecord) -> HistoryPoint {
    HistoryPoint {
        date: record.date.format(DATE_FORMAT).to_string(),
        open: record.open,
        high: record.high,
        low: record.low,
        close: record.close,
        volume: record.volume,
    }
}

fn normalize_ticker(ticker: Option<&str>) -> Option<String> {
    ticker
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn history(days: usize) -> History {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = (0..days)
            .map(|i| {
                let close = 100.0 + i as f64;
                OhlcvRecord::new(
                    start + Duration::days(i as i64),
                    close - 0.5,
                    close + 1.0,
                    close - 1.0,
                    close,
                    (i * 10) as f64,
                )
            })
            .collect();
        History::from_records(records).unwrap()
    }

    fn window(n: u32) -> Window {
        Window::new(n).unwrap()
    }

    #[test]
    fn test_takes_last_window_records() {
        let hist = history(100);
        let req = build(&hist, window(60), Horizon::Five, Some("AMZN"));

        let points = req.history.as_ref().unwrap();
        assert_eq!(points.len(), 60);
        assert_eq!(
            points.last().unwrap().date,
            hist.last_date().unwrap().format(DATE_FORMAT).to_string()
        );
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(points[0].close, 140.0);
    }

    #[test]
    fn test_short_history_is_sent_whole() {
        let hist = history(12);
        let req = build(&hist, window(30), Horizon::One, None);
        assert_eq!(req.history_len(), 12);
    }

    #[test]
    fn test_empty_history_gives_empty_list() {
        let req = build(&History::empty(), window(30), Horizon::One, None);
        assert_eq!(req.history, Some(vec![]));
    }

    #[test]
    fn test_dates_parse_back_to_original() {
        let hist = history(31);
        let req = build(&hist, window(30), Horizon::Five, None);

        for (point, record) in req.history.unwrap().iter().zip(hist.tail(30)) {
            let parsed = NaiveDate::parse_from_str(&point.date, DATE_FORMAT).unwrap();
            assert_eq!(parsed, record.date);
        }
    }

    #[test]
    fn test_ticker_only_when_non_empty() {
        let hist = history(5);
        assert_eq!(build(&hist, window(30), Horizon::One, Some("  ")).ticker, None);
        assert_eq!(build(&hist, window(30), Horizon::One, None).ticker, None);
        assert_eq!(
            build(&hist, window(30), Horizon::One, Some(" MSFT ")).ticker,
            Some("MSFT".to_string())
        );
    }

    #[test]
    fn test_fields_serialized_as_floats() {
        let hist = history(1);
        let req = build(&hist, window(30), Horizon::One, Some("AMZN"));
        let json = serde_json::to_value(&req).unwrap();

        let first = &json["history"][0];
        assert_eq!(first["date"], "2024-01-01");
        assert!(first["volume"].is_f64());
        assert!(first["open"].is_f64());
        assert_eq!(json["window"], 30);
        assert_eq!(json["horizon"], 1);
    }

    #[test]
    fn test_remote_request_has_no_history() {
        let req = remote("AMZN", window(60), Horizon::Five);
        assert!(req.history.is_none());
        assert_eq!(req.ticker.as_deref(), Some("AMZN"));
    }
}
