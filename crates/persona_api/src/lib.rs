//! Transport-only client primitives for the persona backend services.
//!
//! This crate owns request building, payload shapes, and error parsing for
//! the five HTTP collaborators: identity login/signup, onboarding submit,
//! assistant turn, and image generation. It intentionally contains no
//! session state and no pipeline sequencing; callers own both.
//!
//! Identity endpoints may return an HTTP 200 envelope carrying an `error`
//! string field; that shape is surfaced as [`ApiError::Embedded`] so callers
//! treat it exactly like a non-success status.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::{ApiClient, AuthGrant, CancellationSignal};
pub use config::ApiConfig;
pub use error::ApiError;
pub use payload::{
    AssistantRequest, AssistantResponse, AuthResponse, ImageRequest, ImageResponse, LoginRequest,
    OnboardRequest, SignupRequest,
};
pub use url::{login_url, onboard_url, signup_url, DEFAULT_IDENTITY_BASE_URL};
