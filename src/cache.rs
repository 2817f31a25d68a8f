//! JSON snapshot cache and the once-a-day freshness check.
//!
//! The snapshot is the raw Alpha Vantage payload. It is considered fresh when
//! the newest timestamp it contains falls on `today`; anything else triggers a
//! single fetch that overwrites the file wholesale.

use chrono::NaiveDate;
use serde_json::Value;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

use crate::api::TimeSeriesProvider;
use crate::error::EtlError;
use crate::models::TIME_SERIES_KEY;
use crate::transform::{parse_timestamp, time_series};

/// How the snapshot returned by [`ensure_current`] was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Cached file already covers today, nothing fetched
    Fresh,
    /// Cached file was older than today (or empty) and has been replaced
    Stale { latest: Option<NaiveDate> },
    /// No cached file existed, first fetch
    Missing,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub payload: Value,
    pub status: CacheStatus,
}

pub fn load_snapshot(path: &Path) -> Result<Value, EtlError> {
    let file = fs::File::open(path).map_err(|e| EtlError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| EtlError::InvalidJson {
        context: path.display().to_string(),
        source,
    })
}

/// Overwrite the snapshot. Writes a `.tmp` sibling first and renames it into place.
pub fn store_snapshot(path: &Path, payload: &Value) -> Result<(), EtlError> {
    let tmp_path = path.with_extension("json.tmp");

    let file = fs::File::create(&tmp_path).map_err(|e| EtlError::io(&tmp_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, payload).map_err(|source| EtlError::InvalidJson {
        context: tmp_path.display().to_string(),
        source,
    })?;
    writer.flush().map_err(|e| EtlError::io(&tmp_path, e))?;
    drop(writer);

    fs::rename(&tmp_path, path).map_err(|e| EtlError::io(path, e))
}

/// Newest calendar date among the series keys, `None` for an empty series.
pub fn latest_snapshot_date(raw: &Value) -> Result<Option<NaiveDate>, EtlError> {
    let mut latest = None;
    for key in time_series(raw)?.keys() {
        let date = parse_timestamp(key)?.date();
        latest = latest.max(Some(date));
    }
    Ok(latest)
}

/// Make sure the cache at `cache_path` holds today's data, fetching at most once.
pub async fn ensure_current<P>(
    provider: &P,
    cache_path: &Path,
    today: NaiveDate,
) -> Result<Snapshot, EtlError>
where
    P: TimeSeriesProvider + ?Sized,
{
    if !cache_path.is_file() {
        info!("No file exists yet. Fetching latest data from source...");
        let payload = refresh(provider, cache_path).await?;
        return Ok(Snapshot {
            payload,
            status: CacheStatus::Missing,
        });
    }

    let cached = load_snapshot(cache_path)?;
    let latest = match latest_snapshot_date(&cached) {
        Ok(latest) => latest,
        Err(e) => {
            error!("{} key not usable in {}: {}", TIME_SERIES_KEY, cache_path.display(), e);
            return Err(e);
        }
    };

    if latest == Some(today) {
        info!(
            "The latest date in this file located at: ({}) matches today's date: ({}).",
            cache_path.display(),
            today
        );
        return Ok(Snapshot {
            payload: cached,
            status: CacheStatus::Fresh,
        });
    }

    match latest {
        Some(date) => info!("File exists, but needs updating (latest {}). Fetching latest data from source...", date),
        None => info!("File exists, but holds no bars. Fetching latest data from source..."),
    }
    let payload = refresh(provider, cache_path).await?;
    Ok(Snapshot {
        payload,
        status: CacheStatus::Stale { latest },
    })
}

async fn refresh<P>(provider: &P, cache_path: &Path) -> Result<Value, EtlError>
where
    P: TimeSeriesProvider + ?Sized,
{
    let payload = provider.fetch_intraday().await?;
    // Throttle and error envelopes never reach the cache file
    if let Err(e) = time_series(&payload) {
        error!("Fetched payload is unusable, keeping {}: {}", cache_path.display(), e);
        return Err(e);
    }
    store_snapshot(cache_path, &payload)?;
    info!("💾 Cached response at {}", cache_path.display());
    Ok(payload)
}
