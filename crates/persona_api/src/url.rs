/// Default base URL for identity and onboarding endpoints.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "http://localhost:3010/api/onboard";

/// Normalize a base URL: trim whitespace and trailing slashes, falling back
/// to the default when blank.
#[must_use]
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_IDENTITY_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

#[must_use]
pub fn login_url(base: &str) -> String {
    format!("{}/login", normalize_base_url(base))
}

#[must_use]
pub fn signup_url(base: &str) -> String {
    format!("{}/signup", normalize_base_url(base))
}

#[must_use]
pub fn onboard_url(base: &str) -> String {
    format!("{}/onboard", normalize_base_url(base))
}
