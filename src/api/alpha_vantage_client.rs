use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use super::TimeSeriesProvider;
use crate::error::EtlError;
use crate::models::{Config, INTERVAL, SYMBOL};

/// Keys Alpha Vantage uses for throttling and error envelopes
const NOTICE_KEYS: [&str; 3] = ["Note", "Information", "Error Message"];

/// Alpha Vantage API client
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    pub fn new(config: &Config) -> Result<Self, EtlError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("stock-intraday/0.1")
            .build()
            .map_err(|source| EtlError::Network {
                url: config.api_base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.clone(),
        })
    }

    /// Full-size 30-minute intraday series URL for the fixed ticker
    pub fn intraday_url(&self) -> Result<Url, EtlError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", SYMBOL),
                ("interval", INTERVAL),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| EtlError::Config(format!("invalid API base URL '{}': {}", self.base_url, e)))
    }
}

#[async_trait]
impl TimeSeriesProvider for AlphaVantageClient {
    async fn fetch_intraday(&self) -> Result<Value, EtlError> {
        let url = self.intraday_url()?;
        let display_url = redact_api_key(&url);

        info!("📡 Fetching {} {} intraday data from {}", SYMBOL, INTERVAL, display_url);

        let response = self.client.get(url).send().await.map_err(|source| {
            error!("❌ Request to Alpha Vantage failed: {}", source);
            EtlError::Network {
                url: display_url.clone(),
                source,
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| EtlError::Network {
            url: display_url.clone(),
            source,
        })?;
        debug!("Alpha Vantage responded with {} ({} bytes)", status, text.len());

        if !status.is_success() {
            error!("❌ HTTP {} from Alpha Vantage. Response content: {}", status, text);
            return Err(EtlError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = match serde_json::from_str(&text) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Error decoding JSON response. Response content: {}. Error: {}", text, e);
                return Err(EtlError::InvalidJson {
                    context: "Alpha Vantage response".to_string(),
                    source: e,
                });
            }
        };

        if let Some(notice) = vendor_notice(&payload) {
            warn!("⚠️  Alpha Vantage returned a notice instead of data: {}", notice);
        }

        Ok(payload)
    }
}

/// Render a request URL with the `apikey` parameter masked
pub fn redact_api_key(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "apikey" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Throttling or error message embedded in an otherwise valid JSON response
pub fn vendor_notice(payload: &Value) -> Option<&str> {
    NOTICE_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
}
