//! HTTP-backed implementation of the shared `chat_backend` contract.
//!
//! This adapter bridges the synchronous backend traits onto the async
//! `persona_api` transport primitives. Each operation runs on a fresh
//! current-thread tokio runtime owned by the calling worker thread.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chat_backend::{
    AssistantBackend, AssistantReply, AuthGrant, BackendInitError, BackendProfile, CancelSignal,
    ChatBackend, Credentials, IdentityBackend, ImageRequest, OnboardingBackend, OnboardingProfile,
    TurnRequest,
};
use persona_api::{
    ApiClient, ApiConfig, ApiError, AssistantRequest, AssistantResponse, AuthGrant as WireGrant,
    ImageRequest as WireImageRequest, ImageResponse, LoginRequest, OnboardRequest, SignupRequest,
};
use serde::Deserialize;

/// Stable backend identifier used for explicit startup selection.
pub const HTTP_BACKEND_ID: &str = "http";

/// Runtime configuration for the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackendConfig {
    pub assistant_url: String,
    pub image_url: String,
    pub identity_base_url: Option<String>,
    pub bearer_token: Option<String>,
    pub timeout: Option<Duration>,
}

/// On-disk JSON shape for [`HttpBackendConfig`]. Unknown keys are rejected so
/// a typoed field fails loudly instead of silently reverting to a default.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
struct HttpBackendConfigFile {
    assistant_url: String,
    image_url: String,
    #[serde(default)]
    identity_base_url: Option<String>,
    #[serde(default)]
    bearer_token: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new(assistant_url: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            assistant_url: assistant_url.into(),
            image_url: image_url.into(),
            identity_base_url: None,
            bearer_token: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_identity_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.identity_base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BackendInitError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|error| {
            BackendInitError::new(format!(
                "failed to read backend config {}: {error}",
                path.display()
            ))
        })?;
        let file: HttpBackendConfigFile = serde_json::from_str(&raw).map_err(|error| {
            BackendInitError::new(format!(
                "failed to parse backend config {}: {error}",
                path.display()
            ))
        })?;

        Ok(Self {
            assistant_url: file.assistant_url,
            image_url: file.image_url,
            identity_base_url: file.identity_base_url,
            bearer_token: file.bearer_token,
            timeout: file.timeout_secs.map(Duration::from_secs),
        })
    }

    fn into_api_config(self) -> ApiConfig {
        let mut config = ApiConfig::new(self.assistant_url, self.image_url);

        if let Some(base_url) = self.identity_base_url {
            config = config.with_identity_base_url(base_url);
        }

        if let Some(token) = self.bearer_token {
            config = config.with_bearer_token(token);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait ApiBridge: Send + Sync {
    fn login(&self, request: &LoginRequest, cancel: &CancelSignal) -> Result<WireGrant, ApiError>;

    fn signup(&self, request: &SignupRequest, cancel: &CancelSignal)
        -> Result<WireGrant, ApiError>;

    fn submit_onboarding(
        &self,
        request: &OnboardRequest,
        cancel: &CancelSignal,
    ) -> Result<(), ApiError>;

    fn assistant_turn(
        &self,
        request: &AssistantRequest,
        cancel: &CancelSignal,
    ) -> Result<AssistantResponse, ApiError>;

    fn generate_image(
        &self,
        request: &WireImageRequest,
        cancel: &CancelSignal,
    ) -> Result<ImageResponse, ApiError>;
}

#[derive(Debug)]
struct DefaultApiBridge {
    client: ApiClient,
}

impl DefaultApiBridge {
    fn block_on<F, T>(&self, future: F) -> Result<T, ApiError>
    where
        F: std::future::Future<Output = Result<T, ApiError>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                ApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(future)
    }
}

impl ApiBridge for DefaultApiBridge {
    fn login(&self, request: &LoginRequest, cancel: &CancelSignal) -> Result<WireGrant, ApiError> {
        self.block_on(self.client.login(request, Some(cancel)))
    }

    fn signup(
        &self,
        request: &SignupRequest,
        cancel: &CancelSignal,
    ) -> Result<WireGrant, ApiError> {
        self.block_on(self.client.signup(request, Some(cancel)))
    }

    fn submit_onboarding(
        &self,
        request: &OnboardRequest,
        cancel: &CancelSignal,
    ) -> Result<(), ApiError> {
        self.block_on(self.client.submit_onboarding(request, Some(cancel)))
    }

    fn assistant_turn(
        &self,
        request: &AssistantRequest,
        cancel: &CancelSignal,
    ) -> Result<AssistantResponse, ApiError> {
        self.block_on(self.client.assistant_turn(request, Some(cancel)))
    }

    fn generate_image(
        &self,
        request: &WireImageRequest,
        cancel: &CancelSignal,
    ) -> Result<ImageResponse, ApiError> {
        self.block_on(self.client.generate_image(request, Some(cancel)))
    }
}

/// `ChatBackend` adapter backed by `persona_api` transport primitives.
pub struct HttpBackend {
    bridge: Arc<dyn ApiBridge>,
}

impl HttpBackend {
    /// Creates a backend using real HTTP transport.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendInitError> {
        let client = ApiClient::new(config.into_api_config()).map_err(map_init_error)?;

        Ok(Self {
            bridge: Arc::new(DefaultApiBridge { client }),
        })
    }

    #[cfg(test)]
    fn with_bridge_for_tests(bridge: Arc<dyn ApiBridge>) -> Self {
        Self { bridge }
    }

    fn uncancelled() -> CancelSignal {
        Arc::new(std::sync::atomic::AtomicBool::new(false))
    }
}

impl IdentityBackend for HttpBackend {
    fn login(&self, credentials: &Credentials) -> Result<AuthGrant, String> {
        let request = LoginRequest {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
        };
        let grant = self
            .bridge
            .login(&request, &Self::uncancelled())
            .map_err(|error| error.to_string())?;

        Ok(into_grant(grant))
    }

    fn signup(&self, credentials: &Credentials) -> Result<AuthGrant, String> {
        let request = SignupRequest {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
            full_name: credentials.full_name.clone().unwrap_or_default(),
        };
        let grant = self
            .bridge
            .signup(&request, &Self::uncancelled())
            .map_err(|error| error.to_string())?;

        Ok(into_grant(grant))
    }
}

impl OnboardingBackend for HttpBackend {
    fn submit_profile(
        &self,
        profile: &OnboardingProfile,
        session_id: Option<&str>,
    ) -> Result<(), String> {
        let request = OnboardRequest {
            session_id: session_id.map(str::to_string),
            profession: profile.profession.clone(),
            hobbies: profile.hobbies.clone(),
            interests: profile.interests.clone(),
            themes: profile.themes.clone(),
        };

        self.bridge
            .submit_onboarding(&request, &Self::uncancelled())
            .map_err(|error| error.to_string())
    }
}

impl AssistantBackend for HttpBackend {
    fn ask(&self, request: TurnRequest, cancel: CancelSignal) -> Result<AssistantReply, String> {
        let wire = AssistantRequest {
            question: request.question,
            session_id: request.session_id,
            full_name: request.display_name,
        };
        let response = self
            .bridge
            .assistant_turn(&wire, &cancel)
            .map_err(|error| error.to_string())?;

        Ok(AssistantReply {
            text: response.text,
        })
    }

    fn generate_image(
        &self,
        request: ImageRequest,
        cancel: CancelSignal,
    ) -> Result<String, String> {
        let wire = WireImageRequest {
            session_id: request.session_id,
            input: request.input,
        };
        let response = self
            .bridge
            .generate_image(&wire, &cancel)
            .map_err(|error| error.to_string())?;

        response
            .image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| "image response is missing an image URL".to_string())
    }
}

impl ChatBackend for HttpBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend_id: HTTP_BACKEND_ID.to_string(),
        }
    }
}

fn into_grant(grant: WireGrant) -> AuthGrant {
    AuthGrant {
        token: grant.token,
        full_name: grant.full_name,
    }
}

fn map_init_error(error: ApiError) -> BackendInitError {
    BackendInitError::new(format!("Failed to initialize http backend: {error}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeBridge {
        observed_assistant: Mutex<Option<AssistantRequest>>,
        observed_image: Mutex<Option<WireImageRequest>>,
        observed_onboard: Mutex<Option<OnboardRequest>>,
        login_outcome: Mutex<Option<Result<WireGrant, ApiError>>>,
        assistant_outcome: Mutex<Option<Result<AssistantResponse, ApiError>>>,
        image_outcome: Mutex<Option<Result<ImageResponse, ApiError>>>,
    }

    impl ApiBridge for FakeBridge {
        fn login(
            &self,
            _request: &LoginRequest,
            _cancel: &CancelSignal,
        ) -> Result<WireGrant, ApiError> {
            self.login_outcome
                .lock()
                .expect("lock login outcome")
                .take()
                .expect("login outcome configured")
        }

        fn signup(
            &self,
            _request: &SignupRequest,
            _cancel: &CancelSignal,
        ) -> Result<WireGrant, ApiError> {
            self.login_outcome
                .lock()
                .expect("lock signup outcome")
                .take()
                .expect("signup outcome configured")
        }

        fn submit_onboarding(
            &self,
            request: &OnboardRequest,
            _cancel: &CancelSignal,
        ) -> Result<(), ApiError> {
            *self.observed_onboard.lock().expect("lock onboard") = Some(request.clone());
            Ok(())
        }

        fn assistant_turn(
            &self,
            request: &AssistantRequest,
            _cancel: &CancelSignal,
        ) -> Result<AssistantResponse, ApiError> {
            *self.observed_assistant.lock().expect("lock assistant") = Some(request.clone());
            self.assistant_outcome
                .lock()
                .expect("lock assistant outcome")
                .take()
                .expect("assistant outcome configured")
        }

        fn generate_image(
            &self,
            request: &WireImageRequest,
            _cancel: &CancelSignal,
        ) -> Result<ImageResponse, ApiError> {
            *self.observed_image.lock().expect("lock image") = Some(request.clone());
            self.image_outcome
                .lock()
                .expect("lock image outcome")
                .take()
                .expect("image outcome configured")
        }
    }

    fn uncancelled() -> CancelSignal {
        Arc::new(AtomicBool::new(false))
    }

    fn turn(question: &str) -> TurnRequest {
        TurnRequest {
            turn_id: 1,
            question: question.to_string(),
            session_id: Some("session-1".to_string()),
            display_name: "Ada".to_string(),
        }
    }

    #[test]
    fn ask_forwards_session_context_and_returns_reply_text() {
        let bridge = Arc::new(FakeBridge::default());
        *bridge.assistant_outcome.lock().expect("configure") = Some(Ok(AssistantResponse {
            text: Some("Hello Ada".to_string()),
        }));
        let backend = HttpBackend::with_bridge_for_tests(Arc::clone(&bridge) as Arc<dyn ApiBridge>);

        let reply = backend.ask(turn("hello"), uncancelled()).expect("reply");
        assert_eq!(reply.text.as_deref(), Some("Hello Ada"));

        let observed = bridge
            .observed_assistant
            .lock()
            .expect("observed")
            .clone()
            .expect("assistant request captured");
        assert_eq!(observed.question, "hello");
        assert_eq!(observed.session_id.as_deref(), Some("session-1"));
        assert_eq!(observed.full_name, "Ada");
    }

    #[test]
    fn reply_without_text_passes_through_unchanged() {
        let bridge = Arc::new(FakeBridge::default());
        *bridge.assistant_outcome.lock().expect("configure") =
            Some(Ok(AssistantResponse { text: None }));
        let backend = HttpBackend::with_bridge_for_tests(bridge);

        let reply = backend.ask(turn("hello"), uncancelled()).expect("reply");
        assert_eq!(reply.text, None);
    }

    #[test]
    fn image_response_without_url_is_a_failure() {
        let bridge = Arc::new(FakeBridge::default());
        *bridge.image_outcome.lock().expect("configure") =
            Some(Ok(ImageResponse { image_url: None }));
        let backend = HttpBackend::with_bridge_for_tests(bridge);

        let error = backend
            .generate_image(
                ImageRequest {
                    session_id: Some("session-1".to_string()),
                    input: "draw an image".to_string(),
                },
                uncancelled(),
            )
            .expect_err("missing URL must fail");
        assert!(error.contains("missing an image URL"));
    }

    #[test]
    fn embedded_identity_error_surfaces_its_message_verbatim() {
        let bridge = Arc::new(FakeBridge::default());
        *bridge.login_outcome.lock().expect("configure") =
            Some(Err(ApiError::Embedded("Invalid credentials".to_string())));
        let backend = HttpBackend::with_bridge_for_tests(bridge);

        let error = backend
            .login(&Credentials {
                email: "ada@example.com".to_string(),
                password: "wrong".to_string(),
                full_name: None,
            })
            .expect_err("login must fail");
        assert_eq!(error, "Invalid credentials");
    }

    #[test]
    fn onboarding_submission_forwards_profile_and_session_id() {
        let bridge = Arc::new(FakeBridge::default());
        let backend = HttpBackend::with_bridge_for_tests(Arc::clone(&bridge) as Arc<dyn ApiBridge>);

        backend
            .submit_profile(
                &OnboardingProfile {
                    profession: "Engineer".to_string(),
                    hobbies: vec!["chess".to_string()],
                    interests: vec!["rust".to_string()],
                    themes: vec!["dark".to_string()],
                },
                Some("session-1"),
            )
            .expect("submission succeeds");

        let observed = bridge
            .observed_onboard
            .lock()
            .expect("observed")
            .clone()
            .expect("onboard request captured");
        assert_eq!(observed.session_id.as_deref(), Some("session-1"));
        assert_eq!(observed.profession, "Engineer");
        assert_eq!(observed.themes, vec!["dark".to_string()]);
    }

    #[test]
    fn config_file_round_trips_and_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        write!(
            file,
            r#"{{
                "assistant_url": "http://localhost:3010/api/chat",
                "image_url": "http://localhost:3010/api/image",
                "timeout_secs": 10
            }}"#
        )
        .expect("write config");

        let config = HttpBackendConfig::from_json_file(file.path()).expect("config parses");
        assert_eq!(config.assistant_url, "http://localhost:3010/api/chat");
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.identity_base_url, None);

        let mut bad = tempfile::NamedTempFile::new().expect("temp config file");
        write!(bad, r#"{{"assistant_url": "a", "image_url": "b", "nope": 1}}"#)
            .expect("write config");
        let error = HttpBackendConfig::from_json_file(bad.path())
            .expect_err("unknown key must be rejected");
        assert!(error.message().contains("failed to parse backend config"));
    }
}
