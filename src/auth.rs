use chat_backend::Credentials;

/// Identity flow variant. Login marks the account as previously onboarded;
/// signup routes through the onboarding wizard first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

pub const VALIDATION_MESSAGE: &str = "Please fill in all fields";

/// Form state collected by the auth screen before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            email: String::new(),
            password: String::new(),
            full_name: String::new(),
        }
    }
}

impl AuthForm {
    /// Validates the form locally and produces submission credentials.
    /// Email and password are always required; the full name additionally
    /// for signup. No network call happens on validation failure.
    pub fn validate(&self) -> Result<Credentials, String> {
        let email = self.email.trim();
        let password = self.password.trim();
        let full_name = self.full_name.trim();

        if email.is_empty() || password.is_empty() {
            return Err(VALIDATION_MESSAGE.to_string());
        }

        if self.mode == AuthMode::Signup && full_name.is_empty() {
            return Err(VALIDATION_MESSAGE.to_string());
        }

        Ok(Credentials {
            email: email.to_string(),
            password: password.to_string(),
            full_name: match self.mode {
                AuthMode::Signup => Some(full_name.to_string()),
                AuthMode::Login => None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_email_and_password_only() {
        let form = AuthForm {
            mode: AuthMode::Login,
            email: " ada@example.com ".to_string(),
            password: "hunter2".to_string(),
            full_name: String::new(),
        };

        let credentials = form.validate().expect("login form is complete");
        assert_eq!(credentials.email, "ada@example.com");
        assert_eq!(credentials.full_name, None);
    }

    #[test]
    fn signup_additionally_requires_a_full_name() {
        let mut form = AuthForm {
            mode: AuthMode::Signup,
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
            full_name: "  ".to_string(),
        };

        assert_eq!(
            form.validate().expect_err("blank name must fail"),
            VALIDATION_MESSAGE
        );

        form.full_name = "Ada Lovelace".to_string();
        let credentials = form.validate().expect("signup form is complete");
        assert_eq!(credentials.full_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn blank_required_fields_fail_without_credentials() {
        let form = AuthForm {
            mode: AuthMode::Login,
            email: String::new(),
            password: "hunter2".to_string(),
            full_name: String::new(),
        };

        assert_eq!(
            form.validate().expect_err("blank email must fail"),
            VALIDATION_MESSAGE
        );
    }
}
