//! CSV import for the upload mode.
//!
//! Required columns: `Open, High, Low, Close, Volume`, matched
//! case-insensitively. An optional `Date` column orders the rows; without it
//! the rows keep file order and are dated on consecutive calendar days ending
//! on the import date.
//!
//! A row with a blank required cell is skipped. Anything else that fails to
//! parse rejects the whole file.

use crate::domain::errors::UploadError;
use crate::domain::ohlcv::{History, OhlcvRecord};
use chrono::{Duration, Local, NaiveDate};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const REQUIRED: [&str; 5] = ["open", "high", "low", "close", "volume"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

pub fn import_file(path: &Path) -> Result<History, UploadError> {
    let file = std::fs::File::open(path)?;
    let history = parse_csv(file, Local::now().date_naive())?;
    info!(
        "CsvImport: Loaded {} rows from {}",
        history.len(),
        path.display()
    );
    Ok(history)
}

pub fn import_bytes(bytes: &[u8]) -> Result<History, UploadError> {
    parse_csv(bytes, Local::now().date_naive())
}

pub fn parse_csv<R: Read>(reader: R, today: NaiveDate) -> Result<History, UploadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let find = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<&str> = REQUIRED
        .iter()
        .copied()
        .filter(|name| find(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(UploadError::MissingColumns {
            missing: missing
                .iter()
                .map(|m| capitalize(m))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    // Checked above
    let columns: Vec<usize> = REQUIRED.iter().filter_map(|name| find(name)).collect();
    let date_column = find("date");

    let mut rows: Vec<(Option<NaiveDate>, [f64; 5])> = Vec::new();
    let mut skipped = 0usize;

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1
        let row = idx + 2;

        let mut values = [0.0_f64; 5];
        let mut blank = false;
        for (slot, (&col, name)) in columns.iter().zip(REQUIRED).enumerate() {
            let raw = record.get(col).unwrap_or("");
            if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
                blank = true;
                break;
            }
            values[slot] = raw.parse::<f64>().map_err(|_| UploadError::InvalidNumber {
                row,
                column: capitalize(name),
                value: raw.to_string(),
            })?;
        }
        if blank {
            skipped += 1;
            continue;
        }

        let date = match date_column {
            Some(col) => {
                let raw = record.get(col).unwrap_or("");
                Some(parse_upload_date(raw).ok_or_else(|| UploadError::InvalidDate {
                    row,
                    value: raw.to_string(),
                })?)
            }
            None => None,
        };

        rows.push((date, values));
    }

    if skipped > 0 {
        debug!("CsvImport: Skipped {} rows with blank values", skipped);
    }
    if rows.is_empty() {
        return Err(UploadError::NoRows);
    }

    let count = rows.len() as i64;
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, (date, [open, high, low, close, volume]))| {
            let date = date.unwrap_or_else(|| today - Duration::days(count - 1 - i as i64));
            OhlcvRecord::new(date, open, high, low, close, volume)
        })
        .collect();

    Ok(History::from_records(records)?)
}

/// `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time part.
fn parse_upload_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = match raw.char_indices().nth(10) {
        Some((idx, c)) if c == 'T' || c == ' ' => &raw[..idx],
        _ => raw,
    };
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
