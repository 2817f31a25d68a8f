//! Alpha Vantage client against a mock HTTP server

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{fixtures, logging};
use stock_intraday::api::{AlphaVantageClient, TimeSeriesProvider};
use stock_intraday::EtlError;

async fn client_for(server: &MockServer) -> AlphaVantageClient {
    let config = fixtures::test_config(&format!("{}/query", server.uri()));
    AlphaVantageClient::new(&config).expect("Failed to build client")
}

#[tokio::test]
async fn test_fetch_sends_fixed_query() {
    logging::init_test_logging();
    logging::log_test_step("Fetching intraday data from the mock server");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("function", "TIME_SERIES_INTRADAY"))
        .and(query_param("symbol", "TSLA"))
        .and(query_param("interval", "30min"))
        .and(query_param("outputsize", "full"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::single_bar_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(&server).await.fetch_intraday().await.expect("fetch failed");
    assert_eq!(payload, fixtures::single_bar_payload());
}

#[tokio::test]
async fn test_non_json_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).await.fetch_intraday().await.unwrap_err();
    assert!(matches!(err, EtlError::InvalidJson { .. }));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).await.fetch_intraday().await.unwrap_err();
    match err {
        EtlError::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_throttle_notice_is_passed_through() {
    let server = MockServer::start().await;
    let notice = serde_json::json!({ "Note": "API call frequency is 5 calls per minute" });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(notice.clone()))
        .mount(&server)
        .await;

    let payload = client_for(&server).await.fetch_intraday().await.unwrap();
    assert_eq!(payload, notice);
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Nothing listens on the discard port
    let config = fixtures::test_config("http://127.0.0.1:9/query");
    let client = AlphaVantageClient::new(&config).unwrap();

    let err = client.fetch_intraday().await.unwrap_err();
    match err {
        EtlError::Network { url, .. } => assert!(!url.contains("test-key")),
        other => panic!("unexpected error: {other}"),
    }
}
