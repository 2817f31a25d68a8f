//! CSV artifact for the normalized table.
//!
//! Layout: an unnamed leading row-index column followed by
//! `Datetime,Open,High,Low,Close,Volume`, datetimes as `YYYY-MM-DD HH:MM:SS`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::EtlError;
use crate::models::{IntradayBar, IntradayTable};

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "")]
    index: usize,
    #[serde(rename = "Datetime", with = "datetime_format")]
    datetime: NaiveDateTime,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: i64,
}

mod datetime_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use crate::transform::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Write the table to `path`, replacing any existing file. Returns the row count.
pub fn write_csv(table: &IntradayTable, path: &Path) -> Result<usize, EtlError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(std::iter::once("").chain(IntradayTable::COLUMNS))?;

    for (index, bar) in table.iter().enumerate() {
        writer.serialize(CsvRow {
            index,
            datetime: bar.datetime,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })?;
    }
    writer.flush().map_err(|e| EtlError::io(path, e))?;

    info!("📄 Wrote {} rows to {}", table.len(), path.display());
    Ok(table.len())
}

/// Read a CSV written by [`write_csv`]. The index column is ignored.
pub fn read_csv(path: &Path) -> Result<IntradayTable, EtlError> {
    let mut reader = csv::Reader::from_path(path)?;

    let rows = reader
        .deserialize::<CsvRow>()
        .map(|row| {
            row.map(|r| IntradayBar {
                datetime: r.datetime,
                open: r.open,
                high: r.high,
                low: r.low,
                close: r.close,
                volume: r.volume,
            })
        })
        .collect::<Result<Vec<_>, csv::Error>>()?;

    Ok(IntradayTable::new(rows))
}
