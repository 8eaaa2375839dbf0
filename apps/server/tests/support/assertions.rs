use axum::http::StatusCode;
use serde_json::Value;

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected {expected}, got {actual}"
    );
}

pub fn row_ids(page: &Value) -> Vec<i64> {
    page["rows"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}

pub fn error_status(body: &Value) -> Option<u64> {
    body["error"]["status"].as_u64()
}
