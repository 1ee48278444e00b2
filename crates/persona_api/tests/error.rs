use persona_api::error::{embedded_error, parse_error_message};
use reqwest::StatusCode;

#[test]
fn error_field_wins_over_message_field() {
    let message = parse_error_message(
        StatusCode::BAD_REQUEST,
        r#"{"error":"invalid credentials","message":"ignored"}"#,
    );
    assert_eq!(message, "invalid credentials");
}

#[test]
fn message_field_is_used_when_error_is_absent() {
    let message = parse_error_message(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"message":"database unavailable"}"#,
    );
    assert_eq!(message, "database unavailable");
}

#[test]
fn non_json_body_is_returned_verbatim() {
    let message = parse_error_message(StatusCode::BAD_GATEWAY, "upstream connect error");
    assert_eq!(message, "upstream connect error");
}

#[test]
fn empty_body_falls_back_to_canonical_reason() {
    let message = parse_error_message(StatusCode::NOT_FOUND, "");
    assert_eq!(message, "Not Found");
}

#[test]
fn embedded_error_detects_populated_error_field_only() {
    assert_eq!(
        embedded_error(r#"{"error":"email already registered"}"#).as_deref(),
        Some("email already registered")
    );
    assert_eq!(embedded_error(r#"{"error":""}"#), None);
    assert_eq!(embedded_error(r#"{"token":"tok"}"#), None);
    assert_eq!(embedded_error("not json"), None);
}
