use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::EtlError;

/// Ticker fetched by the pipeline
pub const SYMBOL: &str = "TSLA";
/// Company name used in chart titles
pub const COMPANY_NAME: &str = "Tesla";
/// Alpha Vantage bar interval
pub const INTERVAL: &str = "30min";
/// Key under which Alpha Vantage nests the per-timestamp bars
pub const TIME_SERIES_KEY: &str = "Time Series (30min)";

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const JSON_CACHE_FILE: &str = "tsla_daily_from_current_year_data.json";
pub const CSV_FILE: &str = "tsla_daily_from_current_year_data.csv";
pub const LOG_FILE: &str = "tsla_logger.txt";

/// Environment variables that must be present and non-empty
pub const REQUIRED_VARS: [&str; 4] = ["API_KEY", "DB_USER", "DB_PASSWORD", "DB_NAME"];

/// One normalized 30-minute bar
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayBar {
    pub datetime: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Normalized bars ordered by timestamp.
/// Column order is fixed: Datetime, Open, High, Low, Close, Volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntradayTable {
    pub rows: Vec<IntradayBar>,
}

impl IntradayTable {
    pub const COLUMNS: [&'static str; 6] = ["Datetime", "Open", "High", "Low", "Close", "Volume"];

    pub fn new(mut rows: Vec<IntradayBar>) -> Self {
        rows.sort_by_key(|bar| bar.datetime);
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntradayBar> {
        self.rows.iter()
    }
}

/// Alpha Vantage intraday bar as it appears in the JSON payload
#[derive(Debug, Deserialize)]
pub struct RawIntradayBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// Files the pipeline reads and writes, all relative to one working directory
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub json_cache: PathBuf,
    pub csv: PathBuf,
    pub log_file: PathBuf,
    pub plot_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            json_cache: dir.join(JSON_CACHE_FILE),
            csv: dir.join(CSV_FILE),
            log_file: dir.join(LOG_FILE),
            plot_dir: dir.to_path_buf(),
        }
    }
}

/// Configuration for the application
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub db_user: String,
    pub db_password: String,
    pub db_host: String,
    pub db_port: Option<u16>,
    pub db_name: String,
    pub db_table_name: Option<String>,
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, EtlError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    /// Fails if any of [`REQUIRED_VARS`] is absent or blank, naming all of them.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EtlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| non_empty(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(EtlError::Config(format!(
                "required environment variables are missing: {}. Please check your .env file.",
                missing.join(", ")
            )));
        }

        let db_port = match non_empty("DB_PORT") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                EtlError::Config(format!("DB_PORT must be a port number, got '{}'", raw))
            })?),
            None => None,
        };

        let request_timeout = match non_empty("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|_| {
                EtlError::Config(format!("HTTP_TIMEOUT_SECS must be whole seconds, got '{}'", raw))
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        // Required values were checked above
        let required = |name: &str| non_empty(name).unwrap_or_default();

        Ok(Config {
            api_key: required("API_KEY"),
            db_user: required("DB_USER"),
            db_password: required("DB_PASSWORD"),
            db_host: non_empty("DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            db_port,
            db_name: required("DB_NAME"),
            db_table_name: non_empty("DB_TABLE_NAME"),
            api_base_url: non_empty("ALPHA_VANTAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"***")
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("db_table_name", &self.db_table_name)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
