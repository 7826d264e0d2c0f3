//! Daily OHLCV observations and the ordered history built from them.
//!
//! Every history source (market-data provider, CSV upload) ends up producing a
//! [`History`], which is what the payload builder and the chart consume.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::errors::HistoryError;

/// One trading-day observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// May be zero (e.g. halted sessions, FX pairs).
    pub volume: f64,
}

impl OhlcvRecord {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ordered daily history, strictly increasing by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    records: Vec<OhlcvRecord>,
}

impl History {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sorts the rows by date and rejects duplicate dates.
    pub fn from_records(mut records: Vec<OhlcvRecord>) -> Result<Self, HistoryError> {
        records.sort_by_key(|r| r.date);

        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(HistoryError::DuplicateDate { date: pair[0].date });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[OhlcvRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// The most recent `n` records (all of them when fewer are available).
    pub fn tail(&self, n: usize) -> &[OhlcvRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// `(date, close)` pairs for the most recent `n` records.
    pub fn closes(&self, n: usize) -> Vec<(NaiveDate, f64)> {
        self.tail(n).iter().map(|r| (r.date, r.close)).collect()
    }
}
