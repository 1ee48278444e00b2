use std::time::Duration;

use persona_api::retry::{is_retryable_http_error, retry_delay_ms, BASE_DELAY_MS, MAX_RETRIES};

#[test]
fn retryable_statuses_cover_rate_limit_and_server_errors() {
    for status in [429, 500, 502, 503, 504] {
        assert!(is_retryable_http_error(status, ""), "status {status}");
    }
}

#[test]
fn definitive_client_errors_are_not_retried() {
    for status in [400, 401, 403, 404, 422] {
        assert!(!is_retryable_http_error(status, "bad request"), "status {status}");
    }
}

#[test]
fn transient_error_text_is_retryable_regardless_of_status() {
    assert!(is_retryable_http_error(400, "connection refused"));
    assert!(is_retryable_http_error(400, "Service Unavailable"));
    assert!(is_retryable_http_error(400, "rate limit exceeded"));
}

#[test]
fn backoff_grows_exponentially_from_base_delay() {
    assert_eq!(retry_delay_ms(0), Duration::from_millis(BASE_DELAY_MS));
    assert_eq!(retry_delay_ms(1), Duration::from_millis(BASE_DELAY_MS * 2));
    assert_eq!(retry_delay_ms(2), Duration::from_millis(BASE_DELAY_MS * 4));
}

#[test]
fn max_retries_is_bounded() {
    assert!(MAX_RETRIES <= 5);
}
