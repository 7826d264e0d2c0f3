//! Turns a `/predict` outcome into a dated forecast series.
//!
//! Reference date resolution order:
//! 1. the response's `last_date`, if present and parseable;
//! 2. the last date of the locally known history;
//! 3. today.
//!
//! The first prediction lands on the day after the reference date and every
//! further prediction on the next calendar day. A reference date too close to
//! the end of the calendar to fit the whole horizon is dropped in favour of
//! the next one in the order.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::forecast::{ForecastPoint, PredictionOutcome};
use crate::domain::ohlcv::History;

/// Number of historical closes shown next to the forecast on the chart.
pub const CHART_HISTORY_TAIL: usize = 200;

pub fn normalize(
    outcome: &PredictionOutcome,
    last_known_date: Option<NaiveDate>,
) -> Vec<ForecastPoint> {
    normalize_at(outcome, last_known_date, Local::now().date_naive())
}

pub fn normalize_at(
    outcome: &PredictionOutcome,
    last_known_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<ForecastPoint> {
    let predictions = outcome.predictions();
    if predictions.is_empty() {
        return Vec::new();
    }

    let horizon = Days::new(predictions.len() as u64);
    let mut reference = resolve_reference_date(outcome.last_date(), last_known_date, today);
    if reference.checked_add_days(horizon).is_none() {
        debug!(
            "ResponseNormalizer: reference date {} out of range for {} predictions, falling back",
            reference,
            predictions.len()
        );
        reference = last_known_date.unwrap_or(today);
    }

    // Stops at the calendar's end rather than wrapping or panicking
    predictions
        .iter()
        .zip(1u64..)
        .map_while(|(&predicted_close, offset)| {
            reference
                .checked_add_days(Days::new(offset))
                .map(|date| ForecastPoint { date, predicted_close })
        })
        .collect()
}

pub fn resolve_reference_date(
    response_last_date: Option<&str>,
    last_known_date: Option<NaiveDate>,
    today: NaiveDate,
) -> NaiveDate {
    if let Some(raw) = response_last_date {
        match parse_date(raw) {
            Some(date) => return date,
            None => debug!(
                "ResponseNormalizer: unparseable last_date {:?}, falling back",
                raw
            ),
        }
    }
    last_known_date.unwrap_or(today)
}

/// Accepts `YYYY-MM-DD`, RFC 3339 and naive `T`/space separated datetimes.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Chart series: the last `tail` historical closes followed by the forecast.
pub fn combined_close_series(
    history: Option<&History>,
    points: &[ForecastPoint],
    tail: usize,
) -> Vec<(NaiveDate, f64)> {
    let mut series = history.map(|h| h.closes(tail)).unwrap_or_default();
    series.extend(points.iter().map(|p| (p.date, p.predicted_close)));
    series
}
