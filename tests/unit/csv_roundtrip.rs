//! CSV artifact written and read back

use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_log::test;

use crate::common::{fixtures, logging};
use stock_intraday::export::{read_csv, write_csv};
use stock_intraday::transform::normalize;

#[test]
fn test_csv_roundtrip_preserves_rows() {
    logging::init_test_logging();
    logging::log_test_step("Round-tripping two sessions through CSV");

    let dir = tempdir().unwrap();
    let path = dir.path().join("bars.csv");

    let mut timestamps = fixtures::extended_timestamps("2024-03-04");
    timestamps.extend(fixtures::extended_timestamps("2024-03-05"));
    let table = normalize(&fixtures::payload_for(&timestamps)).unwrap();

    let written = write_csv(&table, &path).expect("Failed to write CSV");
    assert_eq!(written, table.len());

    let reloaded = read_csv(&path).expect("Failed to read CSV");
    assert_eq!(reloaded, table);
}

#[test]
fn test_index_column_counts_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bars.csv");
    let table = normalize(&fixtures::payload_for(&fixtures::session_timestamps("2024-03-04"))).unwrap();

    write_csv(&table, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();

    let indexes: Vec<usize> = text
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(indexes, (0..table.len()).collect::<Vec<_>>());
}

#[test]
fn test_rewrite_replaces_previous_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bars.csv");

    let big = normalize(&fixtures::payload_for(&fixtures::session_timestamps("2024-03-04"))).unwrap();
    let small = normalize(&fixtures::single_bar_payload()).unwrap();

    write_csv(&big, &path).unwrap();
    write_csv(&small, &path).unwrap();

    assert_eq!(read_csv(&path).unwrap(), small);
}
