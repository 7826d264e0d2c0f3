use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while assembling an ordered history
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistoryError {
    #[error("Duplicate date in history: {date}")]
    DuplicateDate { date: NaiveDate },
}

/// Errors related to user-facing request parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Invalid horizon {value}: must be 1 or 5")]
    InvalidHorizon { value: u32 },

    #[error("Invalid window {value}: must be between {min} and {max}")]
    InvalidWindow { value: u32, min: u32, max: u32 },

    #[error("Invalid input mode: {value}. Must be 'remote', 'local' or 'upload'")]
    InvalidInputMode { value: String },

    #[error("Ticker is required for {mode} mode")]
    MissingTicker { mode: String },
}

/// Errors raised while importing an uploaded CSV history.
/// Any of these rejects the whole file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("CSV must contain columns: Open, High, Low, Close, Volume (missing: {missing})")]
    MissingColumns { missing: String },

    #[error("Row {row}: invalid number in column '{column}': {value:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: invalid date {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("CSV contains no usable rows")]
    NoRows,

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read CSV file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Errors related to the market-data provider
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Market data request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Market data provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Market data provider error for {ticker}: {reason}")]
    Provider { ticker: String, reason: String },

    #[error("Malformed market data for {ticker}: {reason}")]
    InvalidData { ticker: String, reason: String },

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Transport-level failure of a forecasting API call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request timed out after {timeout_secs:.1}s")]
    Timeout { timeout_secs: f64 },

    #[error("Connection failed: {reason}")]
    Connection { reason: String },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {reason}")]
    Other { reason: String },
}
