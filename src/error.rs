//! Error taxonomy for the intraday pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the pipeline can hit. None of them are retried.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Alpha Vantage returned HTTP {status}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid JSON in {context}: {source}")]
    InvalidJson {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("invalid input: {0}")]
    Input(String),
}

impl EtlError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for a payload that lacks the expected time series or carries malformed entries.
    pub fn is_fatal_schema(&self) -> bool {
        matches!(self, EtlError::Schema(_))
    }
}
