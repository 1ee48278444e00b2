use std::collections::BTreeMap;

use crate::config::ApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_USER_AGENT: &str = "user-agent";

const DEFAULT_USER_AGENT: &str = concat!("persona-chat/", env!("CARGO_PKG_VERSION"));

/// Build a deterministic header map for persona backend requests.
///
/// The bearer authorization header is present only while a token is held;
/// identity calls before sign-in go out without one.
#[must_use]
pub fn build_headers(config: &ApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    if let Some(token) = config
        .bearer_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        headers.insert(HEADER_AUTHORIZATION.to_owned(), format!("Bearer {token}"));
    }

    let user_agent = match config.user_agent.as_deref().map(str::trim) {
        Some(explicit) if !explicit.is_empty() => explicit.to_owned(),
        _ => DEFAULT_USER_AGENT.to_owned(),
    };
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_omit_authorization_without_token() {
        let headers = build_headers(&ApiConfig::default());
        assert!(!headers.contains_key(HEADER_AUTHORIZATION));
        assert_eq!(headers[HEADER_ACCEPT], "application/json");
        assert_eq!(headers[HEADER_CONTENT_TYPE], "application/json");
    }

    #[test]
    fn headers_carry_bearer_token_when_held() {
        let config = ApiConfig::default().with_bearer_token("tok-123");
        let headers = build_headers(&config);
        assert_eq!(headers[HEADER_AUTHORIZATION], "Bearer tok-123");
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        let config = ApiConfig::default().with_bearer_token("   ");
        let headers = build_headers(&config);
        assert!(!headers.contains_key(HEADER_AUTHORIZATION));
    }

    #[test]
    fn extra_headers_are_lowercased_and_merged() {
        let config = ApiConfig::default().insert_header("X-Trace-Id", " abc ");
        let headers = build_headers(&config);
        assert_eq!(headers["x-trace-id"], "abc");
    }

    #[test]
    fn user_agent_override_wins_over_default() {
        let config = ApiConfig::default().with_user_agent("  custom-agent  ");
        let headers = build_headers(&config);
        assert_eq!(headers[HEADER_USER_AGENT], "custom-agent");
    }
}
