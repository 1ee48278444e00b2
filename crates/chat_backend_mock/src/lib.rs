//! Deterministic mock implementation of the shared `chat_backend` contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level integration testing. Every operation is
//! synchronous and deterministic; failures are opt-in per concern.

use std::sync::atomic::Ordering;

use chat_backend::{
    AssistantBackend, AssistantReply, AuthGrant, BackendProfile, CancelSignal, ChatBackend,
    Credentials, IdentityBackend, ImageRequest, OnboardingBackend, OnboardingProfile, TurnRequest,
};

/// Stable backend identifier used for explicit startup selection.
pub const MOCK_BACKEND_ID: &str = "mock";

const MOCK_TOKEN: &str = "mock-token";
const MOCK_IMAGE_URL: &str = "https://images.invalid/mock.png";

/// Deterministic mock backend used by `persona_chat` tests and offline runs.
#[derive(Debug, Clone)]
pub struct MockBackend {
    reply_prefix: String,
    image_url: String,
    assistant_failure: Option<String>,
    image_failure: Option<String>,
    identity_failure: Option<String>,
    onboarding_failure: Option<String>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reply_prefix: "You said: ".to_string(),
            image_url: MOCK_IMAGE_URL.to_string(),
            assistant_failure: None,
            image_failure: None,
            identity_failure: None,
            onboarding_failure: None,
        }
    }

    #[must_use]
    pub fn with_reply_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reply_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    /// Makes every assistant turn fail with `message`.
    #[must_use]
    pub fn failing_assistant(mut self, message: impl Into<String>) -> Self {
        self.assistant_failure = Some(message.into());
        self
    }

    /// Makes every image-generation sub-call fail with `message`.
    #[must_use]
    pub fn failing_image(mut self, message: impl Into<String>) -> Self {
        self.image_failure = Some(message.into());
        self
    }

    /// Makes login/signup fail with `message`.
    #[must_use]
    pub fn failing_identity(mut self, message: impl Into<String>) -> Self {
        self.identity_failure = Some(message.into());
        self
    }

    /// Makes profile submission fail with `message`.
    #[must_use]
    pub fn failing_onboarding(mut self, message: impl Into<String>) -> Self {
        self.onboarding_failure = Some(message.into());
        self
    }

    fn grant_for(&self, credentials: &Credentials) -> Result<AuthGrant, String> {
        if let Some(message) = &self.identity_failure {
            return Err(message.clone());
        }

        Ok(AuthGrant {
            token: MOCK_TOKEN.to_string(),
            full_name: credentials.full_name.clone(),
        })
    }
}

impl IdentityBackend for MockBackend {
    fn login(&self, credentials: &Credentials) -> Result<AuthGrant, String> {
        self.grant_for(credentials)
    }

    fn signup(&self, credentials: &Credentials) -> Result<AuthGrant, String> {
        self.grant_for(credentials)
    }
}

impl OnboardingBackend for MockBackend {
    fn submit_profile(
        &self,
        _profile: &OnboardingProfile,
        _session_id: Option<&str>,
    ) -> Result<(), String> {
        match &self.onboarding_failure {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

impl AssistantBackend for MockBackend {
    fn ask(&self, request: TurnRequest, cancel: CancelSignal) -> Result<AssistantReply, String> {
        if cancel.load(Ordering::SeqCst) {
            return Err("cancelled".to_string());
        }

        if let Some(message) = &self.assistant_failure {
            return Err(message.clone());
        }

        Ok(AssistantReply {
            text: Some(format!("{}{}", self.reply_prefix, request.question)),
        })
    }

    fn generate_image(
        &self,
        _request: ImageRequest,
        cancel: CancelSignal,
    ) -> Result<String, String> {
        if cancel.load(Ordering::SeqCst) {
            return Err("cancelled".to_string());
        }

        match &self.image_failure {
            Some(message) => Err(message.clone()),
            None => Ok(self.image_url.clone()),
        }
    }
}

impl ChatBackend for MockBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend_id: MOCK_BACKEND_ID.to_string(),
        }
    }
}
