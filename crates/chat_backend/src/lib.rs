//! Backend-neutral contract between the chat client and its remote services.
//!
//! This crate defines only the seam types: credentials and grants for the
//! identity flow, the onboarding profile, and the per-turn request/reply
//! shapes. It excludes transport details and pipeline sequencing; those live
//! in the backend implementations and the application runtime respectively.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

/// Identifier for one chat turn.
pub type TurnId = u64;

/// Shared cancellation flag observed by backends between suspension points.
pub type CancelSignal = Arc<AtomicBool>;

/// Error returned while constructing/configuring a backend before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInitError {
    message: String,
}

impl BackendInitError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendInitError {}

impl From<String> for BackendInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for BackendInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Credentials collected by the auth screen. `full_name` is present for
/// signup submissions only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Successful identity exchange result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub full_name: Option<String>,
}

/// Profile accumulated across the four onboarding steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingProfile {
    pub profession: String,
    pub hobbies: Vec<String>,
    pub interests: Vec<String>,
    pub themes: Vec<String>,
}

/// One question dispatched to the assistant service. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub turn_id: TurnId,
    pub question: String,
    pub session_id: Option<String>,
    pub display_name: String,
}

/// Assistant reply for one turn. `text` may be absent; callers degrade it to
/// a fixed notice rather than failing the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: Option<String>,
}

/// Dependent image-generation request issued after a successful reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub session_id: Option<String>,
    pub input: String,
}

/// Immutable metadata describing a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProfile {
    pub backend_id: String,
}

/// Identity exchange operations.
pub trait IdentityBackend {
    fn login(&self, credentials: &Credentials) -> Result<AuthGrant, String>;
    fn signup(&self, credentials: &Credentials) -> Result<AuthGrant, String>;
}

/// Onboarding profile submission.
pub trait OnboardingBackend {
    fn submit_profile(
        &self,
        profile: &OnboardingProfile,
        session_id: Option<&str>,
    ) -> Result<(), String>;
}

/// Assistant turn and dependent image-generation operations.
pub trait AssistantBackend {
    /// Sends one question and awaits a single reply.
    fn ask(&self, request: TurnRequest, cancel: CancelSignal) -> Result<AssistantReply, String>;

    /// Requests one generated image reference for `request.input`.
    ///
    /// Failure here never fails the enclosing turn; callers downgrade it to
    /// an inline note.
    fn generate_image(&self, request: ImageRequest, cancel: CancelSignal)
        -> Result<String, String>;
}

/// Full backend surface held by the runtime as one trait object.
pub trait ChatBackend:
    IdentityBackend + OnboardingBackend + AssistantBackend + Send + Sync + 'static
{
    /// Returns backend identity metadata for startup logging.
    fn profile(&self) -> BackendProfile;
}
