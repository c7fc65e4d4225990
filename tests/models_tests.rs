// Model tests: wire shape of records and envelopes, aggregate counting

mod common;

use chrono::DateTime;
use common::*;
use trafficdash::models::*;

const WIRE_RECORD: &str = r#"{
    "timestamp": "2025-08-01T10:15:30.123456+05:30",
    "method": "POST",
    "url": "http://localhost:8000/api/v1/hackrx/run",
    "headers": {"host": "localhost:8000", "authorization": "Bearer x"},
    "body": "{\"documents\": \"a.pdf\", \"questions\": [\"q\"]}",
    "client_ip": "10.0.0.7",
    "status_code": 200,
    "response_time_ms": 1532.27,
    "response_body": null
}"#;

#[test]
fn test_record_parses_backend_wire_shape() {
    let record: Record = serde_json::from_str(WIRE_RECORD).unwrap();
    assert_eq!(record.method, "POST");
    assert_eq!(record.client_ip, "10.0.0.7");
    assert_eq!(record.status_code, Some(200));
    assert_eq!(record.response_time_ms, 1532.27);
    assert_eq!(
        record.headers.get("host").map(String::as_str),
        Some("localhost:8000")
    );
    assert!(record.body.as_deref().unwrap().contains("questions"));
    assert!(record.response_body.is_none());
    assert_eq!(record.timestamp.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    assert!(record.is_success());
}

#[test]
fn test_record_optional_fields_may_be_absent() {
    let json = r#"{
        "timestamp": "2025-08-01T10:15:30+00:00",
        "method": "GET",
        "url": "/health",
        "client_ip": "::1",
        "response_time_ms": 3
    }"#;
    let record: Record = serde_json::from_str(json).unwrap();
    assert!(record.headers.is_empty());
    assert!(record.body.is_none());
    assert_eq!(record.status_code, None);
    assert!(!record.is_success(), "absent status counts as failed");
}

#[test]
fn test_record_null_headers_read_as_empty() {
    let json = r#"{
        "timestamp": "2025-08-01T10:15:30+00:00",
        "method": "GET",
        "url": "/health",
        "client_ip": "::1",
        "headers": null,
        "status_code": 200,
        "response_time_ms": 3
    }"#;
    let record: Record = serde_json::from_str(json).unwrap();
    assert!(record.headers.is_empty());
    assert!(record.is_success());
}

#[test]
fn test_record_out_of_range_status_is_kept_and_failed() {
    for code in [-1_i64, 0, 70000] {
        let json = format!(
            r#"{{"timestamp":"2025-08-01T10:15:30+00:00","method":"GET","url":"/",
                "client_ip":"::1","status_code":{},"response_time_ms":1}}"#,
            code
        );
        let record: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record.status_code, Some(code));
        assert!(!record.is_success(), "status {} counts as failed", code);
    }
}

#[test]
fn test_record_timestamp_without_offset_reads_as_utc() {
    let json = r#"{
        "timestamp": "2025-08-01T10:00:00.123",
        "method": "GET",
        "url": "/",
        "client_ip": "::1",
        "response_time_ms": 1
    }"#;
    let record: Record = serde_json::from_str(json).unwrap();
    assert_eq!(record.timestamp.offset().local_minus_utc(), 0);
    assert_eq!(
        record.timestamp,
        DateTime::parse_from_rfc3339("2025-08-01T10:00:00.123+00:00").unwrap()
    );
}

#[test]
fn test_record_unparseable_timestamp_is_rejected() {
    let json = r#"{"timestamp":"yesterday","method":"GET","url":"/","client_ip":"::1","response_time_ms":1}"#;
    assert!(serde_json::from_str::<Record>(json).is_err());
}

#[test]
fn test_record_missing_required_field_is_rejected() {
    let json = r#"{"timestamp": "2025-08-01T10:15:30+00:00", "method": "GET"}"#;
    assert!(serde_json::from_str::<Record>(json).is_err());
}

#[test]
fn test_only_200_is_success() {
    let cases = [
        (Some(200), true),
        (Some(201), false),
        (Some(204), false),
        (Some(500), false),
        (Some(-1), false),
        (None, false),
    ];
    for (code, expected) in cases {
        assert_eq!(record(0, code).is_success(), expected, "status {:?}", code);
    }
}

#[test]
fn test_record_json_roundtrip_keeps_snake_case() {
    let r = ok(1);
    let json = serde_json::to_string(&r).unwrap();
    assert!(json.contains("\"status_code\":200"));
    assert!(json.contains("\"response_time_ms\""));
    let back: Record = serde_json::from_str(&json).unwrap();
    assert_eq!(back, r);
}

#[test]
fn test_fingerprint_ignores_outcome_fields() {
    let a = record(5, Some(200));
    let mut b = record(5, Some(500));
    b.response_time_ms = 9.0;
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), record(6, Some(200)).fingerprint());
}

#[test]
fn test_aggregates_from_records_counts_all() {
    let records = vec![ok(0), failed(1), record(2, None), ok(3)];
    let agg = Aggregates::from_records(&records);
    assert_eq!(
        agg,
        Aggregates {
            total: 4,
            success: 2,
            failed: 2
        }
    );
}

#[test]
fn test_aggregates_from_empty_is_zero() {
    assert_eq!(Aggregates::from_records(&[]), Aggregates::default());
}

#[test]
fn test_envelope_keeps_unknown_types() {
    let env: Envelope = serde_json::from_str(r#"{"type":"heartbeat"}"#).unwrap();
    assert_eq!(env.type_, "heartbeat");
    assert!(env.data.is_null());
}

#[test]
fn test_logs_response_shape() {
    let json = format!(r#"{{"logs": [{}]}}"#, WIRE_RECORD);
    let resp: LogsResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(resp.logs.len(), 1);
}

#[test]
fn test_store_phase_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&StorePhase::Degraded).unwrap(),
        "\"degraded\""
    );
    assert!(StorePhase::Ready.accepts_live_events());
    assert!(StorePhase::Degraded.accepts_live_events());
    assert!(!StorePhase::Pending.accepts_live_events());
    assert!(!StorePhase::Closed.accepts_live_events());
}
