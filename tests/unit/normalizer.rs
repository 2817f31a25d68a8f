//! Normalization of raw Alpha Vantage payloads

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use crate::common::{fixtures, logging};
use stock_intraday::transform::normalize;
use stock_intraday::EtlError;

#[test]
fn test_single_bar_fixture() {
    logging::init_test_logging();
    logging::log_test_step("Normalizing the single-bar fixture");

    let table = normalize(&fixtures::single_bar_payload()).expect("Failed to normalize");
    assert_eq!(table.len(), 1);

    let bar = &table.rows[0];
    assert_eq!(
        bar.datetime,
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(9, 30, 0).unwrap()
    );
    assert_eq!(bar.open, 100.0);
    assert_eq!(bar.high, 101.0);
    assert_eq!(bar.low, 99.5);
    assert_eq!(bar.close, 100.5);
    assert_eq!(bar.volume, 1000_i64);
}

#[test]
fn test_one_row_per_timestamp_in_time_order() {
    let mut timestamps = fixtures::session_timestamps("2024-03-05");
    timestamps.extend(fixtures::session_timestamps("2024-03-04"));
    let payload = fixtures::payload_for(&timestamps);

    let table = normalize(&payload).expect("Failed to normalize");
    logging::log_test_data("Row count", &table.len());

    assert_eq!(table.len(), timestamps.len());
    assert!(table.rows.windows(2).all(|w| w[0].datetime < w[1].datetime));
    assert_eq!(
        table.rows.first().unwrap().datetime.to_string(),
        "2024-03-04 09:30:00"
    );
    assert_eq!(
        table.rows.last().unwrap().datetime.to_string(),
        "2024-03-05 16:00:00"
    );
}

#[test]
fn test_missing_series_key_yields_no_table() {
    let payload = json!({
        "Meta Data": { "2. Symbol": "TSLA" },
        "Time Series (Daily)": {}
    });

    let result = normalize(&payload);
    assert!(matches!(result, Err(EtlError::Schema(_))));
}

#[test]
fn test_vendor_notice_is_a_schema_error() {
    let payload = json!({
        "Information": "Thank you for using Alpha Vantage! Please subscribe to any of the premium plans"
    });

    let err = normalize(&payload).unwrap_err();
    assert!(err.is_fatal_schema());
    assert!(err.to_string().contains("Time Series (30min)"));
}

#[test]
fn test_missing_field_rejects_payload() {
    let payload = json!({
        "Time Series (30min)": {
            "2024-01-02 09:30:00": {
                "1. open": "100.0",
                "2. high": "101.0",
                "3. low": "99.5",
                "4. close": "100.5"
            }
        }
    });

    assert!(matches!(normalize(&payload), Err(EtlError::Schema(_))));
}

#[test]
fn test_empty_series_gives_empty_table() {
    let table = normalize(&json!({ "Time Series (30min)": {} })).unwrap();
    assert!(table.is_empty());
}
