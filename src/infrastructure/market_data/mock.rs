use crate::domain::errors::MarketDataError;
use crate::domain::ohlcv::{History, OhlcvRecord};
use crate::domain::ports::MarketDataProvider;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

#[derive(Debug, Clone)]
enum MockBehavior {
    Synthetic,
    Fixed(History),
    Failing(String),
}

/// Offline provider producing a deterministic weekday series per ticker.
#[derive(Debug)]
pub struct MockMarketDataProvider {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockMarketDataProvider {
    pub fn new() -> Self {
        Self {
            behavior: MockBehavior::Synthetic,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns (the in-range part of) `history`.
    pub fn with_history(history: History) -> Self {
        Self {
            behavior: MockBehavior::Fixed(history),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Failing(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockMarketDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<History, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Failing(reason) => Err(MarketDataError::Provider {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            }),
            MockBehavior::Fixed(history) => {
                let rows = history
                    .records()
                    .iter()
                    .filter(|r| r.date >= start && r.date < end)
                    .cloned()
                    .collect();
                Ok(History::from_records(rows)?)
            }
            MockBehavior::Synthetic => {
                let history = synthetic_history(ticker, start, end);
                info!(
                    "MockMarketDataProvider: Generated {} bars for {}",
                    history.len(),
                    ticker
                );
                Ok(history)
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn synthetic_history(ticker: &str, start: NaiveDate, end: NaiveDate) -> History {
    let seed = ticker
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
    let base = 50.0 + (seed % 150) as f64;

    let mut records = Vec::new();
    let mut date = start;
    let mut i = 0.0_f64;
    while date < end {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            let close = base + i * 0.15 + (i / 4.0).sin() * 2.5;
            let open = close - (i / 3.0).cos();
            records.push(OhlcvRecord::new(
                date,
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1_000_000.0 + (seed % 1_000) as f64 * 100.0,
            ));
            i += 1.0;
        }
        date += Duration::days(1);
    }

    History::from_records(records).unwrap_or_default()
}
