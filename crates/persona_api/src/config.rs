use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_IDENTITY_BASE_URL;

/// Bounded request timeout applied when no explicit timeout is configured.
/// A request that never resolves must become a deterministic failure rather
/// than leave the pipeline waiting forever.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport configuration for persona backend requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL for identity + onboarding endpoints.
    pub identity_base_url: String,
    /// Full URL of the assistant turn endpoint.
    pub assistant_url: String,
    /// Full URL of the image-generation endpoint.
    pub image_url: String,
    /// Bearer token added to `Authorization` once the user is signed in.
    pub bearer_token: Option<String>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Request timeout; `None` falls back to [`DEFAULT_TIMEOUT`].
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            assistant_url: String::new(),
            image_url: String::new(),
            bearer_token: None,
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl ApiConfig {
    pub fn new(assistant_url: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            assistant_url: assistant_url.into(),
            image_url: image_url.into(),
            ..Self::default()
        }
    }

    pub fn with_identity_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.identity_base_url = base_url.into();
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
