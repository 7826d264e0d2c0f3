use crate::domain::errors::MarketDataError;
use crate::domain::ohlcv::{History, OhlcvRecord};
use crate::domain::ports::MarketDataProvider;
use crate::infrastructure::http_client_factory::{HttpClientFactory, endpoint_url};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

// ===== Wire format of the v8 chart endpoint =====

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

/// Column arrays; `null` marks a missing value.
#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ===== Provider =====

/// Daily bars from the Yahoo Finance chart API.
pub struct YahooMarketDataProvider {
    client: Client,
    base_url: String,
}

impl YahooMarketDataProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooMarketDataProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<History, MarketDataError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(MarketDataError::Provider {
                ticker: String::new(),
                reason: "empty ticker".to_string(),
            });
        }

        let url = endpoint_url(&self.base_url, &format!("v8/finance/chart/{}", ticker));
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp().to_string();
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp().to_string();

        info!(
            "YahooMarketDataProvider: Fetching {} daily bars {} -> {}",
            ticker, start, end
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // 404 bodies still carry a chart.error with the reason.
        let envelope = serde_json::from_str::<ChartEnvelope>(&text);
        if !status.is_success() {
            if let Ok(ChartEnvelope { chart: Chart { error: Some(e), .. } }) = envelope {
                return Err(MarketDataError::Provider {
                    ticker: ticker.to_string(),
                    reason: format!("{}: {}", e.code, e.description),
                });
            }
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body: text.chars().take(300).collect(),
            });
        }

        let envelope = envelope.map_err(|e| MarketDataError::InvalidData {
            ticker: ticker.to_string(),
            reason: e.to_string(),
        })?;

        let history = parse_chart(ticker, envelope, start, end)?;
        debug!(
            "YahooMarketDataProvider: {} rows for {}",
            history.len(),
            ticker
        );
        Ok(history)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

/// Rows with any missing field are dropped; rows outside `[start, end)` too.
fn parse_chart(
    ticker: &str,
    envelope: ChartEnvelope,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<History, MarketDataError> {
    if let Some(err) = envelope.chart.error {
        return Err(MarketDataError::Provider {
            ticker: ticker.to_string(),
            reason: format!("{}: {}", err.code, err.description),
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(History::empty());
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    // Keyed by date so a repeated trailing bar (intraday snapshot) replaces the earlier one.
    let mut rows: BTreeMap<NaiveDate, OhlcvRecord> = BTreeMap::new();
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(dt) = ts
            .checked_add(offset)
            .and_then(|local| DateTime::from_timestamp(local, 0))
        else {
            return Err(MarketDataError::InvalidData {
                ticker: ticker.to_string(),
                reason: format!("timestamp out of range: {}", ts),
            });
        };
        let date = dt.date_naive();
        if date < start || date >= end {
            continue;
        }

        if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
            value_at(&quote.volume, i),
        ) {
            rows.insert(date, OhlcvRecord::new(date, open, high, low, close, volume));
        }
    }

    Ok(History::from_records(rows.into_values().collect())?)
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}
