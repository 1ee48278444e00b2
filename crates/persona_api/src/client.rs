use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::{ApiConfig, DEFAULT_TIMEOUT};
use crate::error::{embedded_error, parse_error_message, ApiError};
use crate::headers::build_headers;
use crate::payload::{
    AssistantRequest, AssistantResponse, AuthResponse, ImageRequest, ImageResponse, LoginRequest,
    OnboardRequest, SignupRequest,
};
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::url::{login_url, onboard_url, signup_url};

/// Optional cancellation signal observed between request attempts.
pub type CancellationSignal = Arc<AtomicBool>;

/// Successful identity exchange: the bearer token plus the display name the
/// service knows the user by, when it reports one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub full_name: Option<String>,
}

#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        if config.assistant_url.trim().is_empty() {
            return Err(ApiError::InvalidEndpoint(
                "assistant URL must not be empty".to_string(),
            ));
        }
        if config.image_url.trim().is_empty() {
            return Err(ApiError::InvalidEndpoint(
                "image-generation URL must not be empty".to_string(),
            ));
        }

        let timeout = config.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| ApiError::InvalidEndpoint(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    ApiError::InvalidEndpoint(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub async fn login(
        &self,
        request: &LoginRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<AuthGrant, ApiError> {
        let url = login_url(&self.config.identity_base_url);
        let body = self.post_with_retry(&url, request, cancellation).await?;
        parse_auth_grant(&body)
    }

    pub async fn signup(
        &self,
        request: &SignupRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<AuthGrant, ApiError> {
        let url = signup_url(&self.config.identity_base_url);
        let body = self.post_with_retry(&url, request, cancellation).await?;
        parse_auth_grant(&body)
    }

    pub async fn submit_onboarding(
        &self,
        request: &OnboardRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<(), ApiError> {
        let url = onboard_url(&self.config.identity_base_url);
        let body = self.post_with_retry(&url, request, cancellation).await?;
        if let Some(message) = embedded_error(&body) {
            return Err(ApiError::Embedded(message));
        }
        Ok(())
    }

    pub async fn assistant_turn(
        &self,
        request: &AssistantRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<AssistantResponse, ApiError> {
        let url = self.config.assistant_url.clone();
        let body = self.post_with_retry(&url, request, cancellation).await?;
        serde_json::from_str::<AssistantResponse>(&body).map_err(ApiError::from)
    }

    pub async fn generate_image(
        &self,
        request: &ImageRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<ImageResponse, ApiError> {
        let url = self.config.image_url.clone();
        let body = self.post_with_retry(&url, request, cancellation).await?;
        serde_json::from_str::<ImageResponse>(&body).map_err(ApiError::from)
    }

    async fn post_with_retry<T: Serialize>(
        &self,
        url: &str,
        payload: &T,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<String, ApiError> {
        let headers = self.header_map()?;
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(ApiError::Cancelled);
            }

            let response = self
                .http
                .post(url)
                .headers(headers.clone())
                .json(payload)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    return response.text().await.map_err(ApiError::from);
                }
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status);
                    let body = response.text().await.unwrap_or_else(|_| {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &body) {
                        tokio::time::sleep(retry_delay_ms(attempt)).await;
                        continue;
                    }

                    return Err(ApiError::Status(status, message));
                }
                Err(error) => {
                    last_error = Some(error.to_string());
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(retry_delay_ms(attempt)).await;
                        continue;
                    }

                    return Err(ApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(ApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }
}

fn parse_auth_grant(body: &str) -> Result<AuthGrant, ApiError> {
    let response = serde_json::from_str::<AuthResponse>(body).map_err(ApiError::from)?;

    if let Some(message) = response
        .error
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
    {
        return Err(ApiError::Embedded(message.to_string()));
    }

    let token = response
        .token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unknown("identity response is missing a token".to_string()))?;

    Ok(AuthGrant {
        token: token.to_string(),
        full_name: response
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    })
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

#[cfg(test)]
mod tests {
    use super::parse_auth_grant;
    use crate::error::ApiError;

    #[test]
    fn auth_grant_parses_token_and_full_name() {
        let grant = parse_auth_grant(r#"{"token":"tok-1","fullName":"Ada Lovelace"}"#)
            .expect("grant should parse");
        assert_eq!(grant.token, "tok-1");
        assert_eq!(grant.full_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn auth_grant_tolerates_missing_full_name() {
        let grant = parse_auth_grant(r#"{"token":"tok-2"}"#).expect("grant should parse");
        assert_eq!(grant.token, "tok-2");
        assert_eq!(grant.full_name, None);
    }

    #[test]
    fn embedded_error_in_success_envelope_is_a_failure() {
        let error = parse_auth_grant(r#"{"error":"email already registered"}"#)
            .expect_err("embedded error must fail");
        match error {
            ApiError::Embedded(message) => assert_eq!(message, "email already registered"),
            other => panic!("expected embedded error, got {other}"),
        }
    }

    #[test]
    fn missing_token_is_rejected() {
        let error = parse_auth_grant(r#"{"fullName":"Ada"}"#).expect_err("token is required");
        assert!(matches!(error, ApiError::Unknown(_)));
    }
}
