//! Bar ingest from CSV files supplied by the data collaborator.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::bar::Bar;
use crate::constant::DataError;

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    #[serde(alias = "datetime", alias = "timestamp")]
    time: String,
    #[serde(alias = "open_price")]
    open: f64,
    #[serde(alias = "high_price")]
    high: f64,
    #[serde(alias = "low_price")]
    low: f64,
    #[serde(alias = "close_price")]
    close: f64,
}

pub fn load_bars_csv(file_path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    let reader = csv::Reader::from_path(file_path.as_ref())?;
    let bars = collect_rows(reader)?;
    debug!(path = %file_path.as_ref().display(), bars = bars.len(), "bars loaded");
    Ok(bars)
}

pub fn read_bars_csv<R: Read>(input: R) -> Result<Vec<Bar>, DataError> {
    collect_rows(csv::Reader::from_reader(input))
}

fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Bar>, DataError> {
    let mut out = Vec::new();
    for row in reader.deserialize::<CsvBarRow>() {
        let row = row?;
        out.push(Bar::new(
            parse_time(&row.time)?,
            row.open,
            row.high,
            row.low,
            row.close,
        ));
    }
    validate_bars(&out)?;
    Ok(out)
}

/// Accepts Unix epoch seconds (milliseconds when the value is too large for
/// seconds), RFC 3339, or naive UTC timestamps.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, DataError> {
    let value = value.trim();
    if let Ok(epoch) = value.parse::<i64>() {
        let parsed = if epoch.abs() >= 100_000_000_000 {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        return parsed.ok_or_else(|| DataError::InvalidDatetime(value.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let patterns = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for pattern in patterns {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }

    Err(DataError::InvalidDatetime(value.to_string()))
}

/// Strictly increasing timestamps and `low <= open, close <= high`, positive prices.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    for (row, bar) in bars.iter().enumerate() {
        if !bar.is_well_formed() {
            return Err(DataError::InvalidBar {
                row,
                reason: format!(
                    "o={} h={} l={} c={}",
                    bar.open, bar.high, bar.low, bar.close
                ),
            });
        }
        if row > 0 && bars[row - 1].time >= bar.time {
            return Err(DataError::OutOfOrder { row });
        }
    }
    Ok(())
}
