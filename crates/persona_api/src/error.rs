use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum ApiError {
    InvalidEndpoint(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    /// HTTP 200 envelope carrying an application-level `error` field.
    Embedded(String),
    Serde(JsonError),
    RetryExhausted {
        status: Option<StatusCode>,
        last_error: Option<String>,
    },
    Cancelled,
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => write!(f, "invalid endpoint URL: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Embedded(message) => write!(f, "{message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::RetryExhausted { status, last_error } => {
                let status = status
                    .map(|status| status.as_u16().to_string())
                    .unwrap_or_else(|| "n/a".to_owned());
                write!(
                    f,
                    "retry exhausted after max attempts (status: {status}, last_error: {last_error:?})"
                )
            }
            Self::Cancelled => write!(f, "request was cancelled"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract the most useful human-readable message from an error body.
///
/// Prefers the `error` field, then `message`, then the raw body, then the
/// canonical status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload
            .error
            .as_deref()
            .or(payload.message.as_deref())
            .map(str::trim)
            .filter(|message| !message.is_empty())
        {
            return message.to_string();
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Detect an application-level error embedded in a 200 envelope.
pub fn embedded_error(body: &str) -> Option<String> {
    let payload = serde_json::from_str::<ErrorPayload>(body).ok()?;
    payload
        .error
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
