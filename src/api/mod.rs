use async_trait::async_trait;
use serde_json::Value;

use crate::error::EtlError;

pub mod alpha_vantage_client;
pub use alpha_vantage_client::AlphaVantageClient;

/// Source of the raw intraday payload.
///
/// The pipeline only ever asks for one thing: the full intraday series for
/// the configured ticker, as parsed JSON.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeSeriesProvider {
    async fn fetch_intraday(&self) -> Result<Value, EtlError>;
}
