// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[parameterized(
    ok = { 200, None },
    created = { 201, None },
    no_content = { 204, None },
    bad_request = { 400, Some("validation") },
    unauthorized = { 401, Some("unauthenticated") },
    forbidden = { 403, Some("validation") },
    conflict = { 409, Some("validation") },
    unprocessable = { 422, Some("validation") },
    too_many = { 429, Some("rate_limited") },
    internal = { 500, Some("server_error") },
    unavailable = { 503, Some("server_error") },
    redirect = { 304, Some("invalid_response") },
)]
fn test_classify_status(status: u16, expected: Option<&str>) {
    let response = HttpResponse::new(status, "");
    assert_eq!(classify_response(&response, now()).map(|e| e.kind()), expected);
}

#[test]
fn test_rate_limited_carries_retry_after() {
    let response = HttpResponse::new(429, "").with_header("Retry-After", "12");
    let err = classify_response(&response, now()).unwrap();
    assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
}

#[test]
fn test_validation_message_from_body() {
    let response = HttpResponse::new(422, r#"{"message":"amount exceeds limit"}"#);
    match classify_response(&response, now()).unwrap() {
        Error::Validation { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "amount exceeds limit");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_classify_transport() {
    assert!(matches!(classify_transport(&TransportFailure::Timeout), Error::Timeout));
    assert!(matches!(
        classify_transport(&TransportFailure::Connect("refused".into())),
        Error::NetworkUnavailable
    ));
    match classify_transport(&TransportFailure::Other("connection reset".into())) {
        Error::ServerError { status, message } => {
            assert_eq!(status, 0);
            assert_eq!(message, "connection reset");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_parse_retry_after_http_date() {
    let hint = parse_retry_after("Sun, 01 Mar 2026 12:00:30 GMT", now()).unwrap();
    assert_eq!(hint, Duration::from_secs(30));
    // Dates in the past mean "now".
    assert_eq!(parse_retry_after("Sun, 01 Mar 2026 11:00:00 GMT", now()), Some(Duration::ZERO));
    assert_eq!(parse_retry_after("soon", now()), None);
}

#[parameterized(
    message = { r#"{"message":"bad"}"#, "bad" },
    error_string = { r#"{"error":"nope"}"#, "nope" },
    nested = { r#"{"error":{"message":"deep"}}"#, "deep" },
    plain = { "  gateway exploded ", "gateway exploded" },
    empty = { "", "no details" },
)]
fn test_extract_message(body: &str, expected: &str) {
    assert_eq!(extract_message(body), expected);
}
