//! Plain-text rendering of API calls and forecasts, used by the CLI and the
//! dashboard's status lines.

use std::fmt::Write as _;

use crate::application::session::{PredictionReport, PredictionView, PreparedPayload};
use crate::application::payload_builder::DATE_FORMAT;
use crate::domain::forecast::ForecastPoint;
use crate::domain::ports::ApiCall;

/// Max characters of the payload shown before truncation.
pub const PAYLOAD_PREVIEW_CHARS: usize = 2000;

/// `OK (0.123s)` or `FAILED (0.123s): <message>`.
pub fn status_line(call: &ApiCall) -> String {
    match &call.outcome {
        Ok(_) => format!("OK ({:.3}s)", call.elapsed_secs()),
        Err(e) => format!("FAILED ({:.3}s): {}", call.elapsed_secs(), e),
    }
}

/// Pretty JSON body of a successful call, `None` on failure.
pub fn body_json(call: &ApiCall) -> Option<String> {
    call.body()
        .map(|b| serde_json::to_string_pretty(&b.to_json()).unwrap_or_default())
}

pub fn render_call(title: &str, call: &ApiCall) -> String {
    let mut out = format!("{}: {}\n", title, status_line(call));
    if let Some(body) = body_json(call) {
        out.push_str(&body);
        out.push('\n');
    }
    out
}

pub fn payload_summary(payload: &PreparedPayload) -> String {
    let request = &payload.request;
    let mut out = format!(
        "Payload [{}] horizon={} window={}",
        payload.mode, request.horizon, request.window
    );
    if let Some(ticker) = &request.ticker {
        let _ = write!(out, " ticker={}", ticker);
    }
    if request.history.is_some() {
        let _ = write!(out, " rows={}", request.history_len());
    }
    if let Some(history) = &payload.history {
        let _ = write!(out, " of {} loaded", history.len());
    }
    out
}

/// `History loaded: N rows (first .. last)` for a locally fetched or uploaded
/// history, `None` when the backend fetches it.
pub fn history_loaded(payload: &PreparedPayload) -> Option<String> {
    let history = payload.history.as_ref()?;
    let mut out = format!("History loaded: {} rows", history.len());
    if let (Some(first), Some(last)) = (history.first_date(), history.last_date()) {
        let _ = write!(
            out,
            " ({} .. {})",
            first.format(DATE_FORMAT),
            last.format(DATE_FORMAT)
        );
    }
    Some(out)
}

pub fn forecast_table(points: &[ForecastPoint]) -> String {
    let mut out = String::from("date        predicted_close\n");
    for p in points {
        let _ = writeln!(
            out,
            "{:<10}  {:>15.4}",
            p.date.format(DATE_FORMAT),
            p.predicted_close
        );
    }
    out
}

pub fn render_report(report: &PredictionReport) -> String {
    let mut out = format!("Predict: OK ({:.3}s)\n", report.elapsed.as_secs_f64());
    out.push_str(&serde_json::to_string_pretty(&report.raw).unwrap_or_default());
    out.push('\n');
    match report.notice() {
        Some(notice) => {
            let _ = writeln!(out, "{}", notice);
        }
        None => out.push_str(&forecast_table(&report.points)),
    }
    out
}

pub fn render_prediction(view: &PredictionView) -> String {
    match view {
        PredictionView::PayloadRequired => {
            "Predict: payload required, prepare one first\n".to_string()
        }
        PredictionView::Failed { message, elapsed } => {
            format!("Predict: FAILED ({:.3}s): {}\n", elapsed.as_secs_f64(), message)
        }
        PredictionView::Completed(report) => render_report(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::payload_builder;
    use crate::domain::errors::ApiError;
    use crate::domain::forecast::{Horizon, PredictionOutcome, Window};
    use crate::domain::input_mode::InputMode;
    use crate::domain::ohlcv::{History, OhlcvRecord};
    use crate::domain::ports::ResponseBody;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_status_lines() {
        let ok = ApiCall {
            elapsed: Duration::from_millis(123),
            outcome: Ok(ResponseBody::Json(json!({"status": "ok"}))),
        };
        assert_eq!(status_line(&ok), "OK (0.123s)");
        assert!(render_call("Health", &ok).contains("\"status\": \"ok\""));

        let failed = ApiCall {
            elapsed: Duration::from_millis(2),
            outcome: Err(ApiError::Status {
                status: 503,
                body: "down".into(),
            }),
        };
        assert_eq!(status_line(&failed), "FAILED (0.002s): HTTP 503: down");
        assert!(body_json(&failed).is_none());
    }

    #[test]
    fn test_summary_reports_loaded_and_sent_rows() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = (0..45)
            .map(|i| OhlcvRecord::new(start + chrono::Duration::days(i), 1.0, 2.0, 0.5, 1.5, 10.0))
            .collect();
        let history = History::from_records(rows).unwrap();
        let request = payload_builder::build(
            &history,
            Window::new(30).unwrap(),
            Horizon::Five,
            None,
        );
        let payload = PreparedPayload {
            mode: InputMode::Upload,
            request,
            history: Some(history),
        };

        assert!(payload_summary(&payload).ends_with("rows=30 of 45 loaded"));
        assert_eq!(
            history_loaded(&payload).unwrap(),
            "History loaded: 45 rows (2024-01-01 .. 2024-02-14)"
        );

        let remote = PreparedPayload {
            mode: InputMode::RemoteFetch,
            request: payload_builder::remote("AMZN", Window::new(30).unwrap(), Horizon::Five),
            history: None,
        };
        assert!(history_loaded(&remote).is_none());
        assert!(!payload_summary(&remote).contains("rows="));
    }

    #[test]
    fn test_forecast_table_rows() {
        let points = vec![
            ForecastPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
                predicted_close: 101.5,
            },
            ForecastPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
                predicted_close: 102.25,
            },
        ];
        let table = forecast_table(&points);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2024-01-06"));
        assert!(lines[2].ends_with("102.2500"));
    }

    #[test]
    fn test_report_with_notice_has_no_table() {
        let report = PredictionReport {
            elapsed: Duration::from_millis(10),
            raw: json!({"detail": "x"}),
            outcome: PredictionOutcome::Unrecognized(json!({"detail": "x"})),
            points: vec![],
            series: vec![],
            empty_body: false,
        };
        let text = render_report(&report);
        assert!(text.contains("did not match"));
        assert!(!text.contains("predicted_close"));
    }
}
