//! Turns the nested Alpha Vantage payload into an [`IntradayTable`].

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::EtlError;
use crate::models::{IntradayBar, IntradayTable, RawIntradayBar, TIME_SERIES_KEY};

/// Timestamp format of the series keys, e.g. `2024-01-02 09:30:00`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(key: &str) -> Result<NaiveDateTime, EtlError> {
    NaiveDateTime::parse_from_str(key.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| EtlError::Schema(format!("invalid timestamp '{}': {}", key, e)))
}

/// Borrow the time series object out of a raw payload.
pub fn time_series(raw: &Value) -> Result<&serde_json::Map<String, Value>, EtlError> {
    match raw.get(TIME_SERIES_KEY) {
        Some(Value::Object(series)) => Ok(series),
        Some(_) => Err(EtlError::Schema(format!(
            "'{}' is not a JSON object",
            TIME_SERIES_KEY
        ))),
        None => Err(EtlError::Schema(format!(
            "expected key '{}' not found in JSON data",
            TIME_SERIES_KEY
        ))),
    }
}

/// Normalize a raw payload into one row per timestamp, sorted by time.
///
/// Fails without producing any rows if the series key is missing or any
/// entry cannot be parsed.
pub fn normalize(raw: &Value) -> Result<IntradayTable, EtlError> {
    let series = time_series(raw)?;
    info!("The {} key exists in the JSON data ({} entries)", TIME_SERIES_KEY, series.len());

    let bars = BTreeMap::<String, RawIntradayBar>::deserialize(&raw[TIME_SERIES_KEY])
        .map_err(|e| EtlError::Schema(format!("malformed bar in '{}': {}", TIME_SERIES_KEY, e)))?;

    let rows = bars
        .iter()
        .map(|(timestamp, bar)| convert_bar(timestamp, bar))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Normalized {} bars", rows.len());
    Ok(IntradayTable::new(rows))
}

fn convert_bar(timestamp: &str, bar: &RawIntradayBar) -> Result<IntradayBar, EtlError> {
    let price = |field: &str, raw: &str| {
        raw.trim().parse::<f64>().map_err(|_| {
            EtlError::Schema(format!("{} at {}: '{}' is not a number", field, timestamp, raw))
        })
    };

    Ok(IntradayBar {
        datetime: parse_timestamp(timestamp)?,
        open: price("open", &bar.open)?,
        high: price("high", &bar.high)?,
        low: price("low", &bar.low)?,
        close: price("close", &bar.close)?,
        volume: bar.volume.trim().parse::<i64>().map_err(|_| {
            EtlError::Schema(format!(
                "volume at {}: '{}' is not an integer",
                timestamp, bar.volume
            ))
        })?,
    })
}
