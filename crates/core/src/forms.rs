//! Login and registration form validation.
//!
//! Validation runs before any network call. The first failing check wins, and
//! its `Display` text is what the user sees.

use serde::Serialize;

/// Minimum length for usernames and passwords.
pub const MIN_CREDENTIAL_LENGTH: usize = 6;

/// Errors raised while validating a form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Username is a required field")]
    UsernameRequired,
    #[error("Username must be at least 6 characters")]
    UsernameTooShort,
    #[error("Password is a required field")]
    PasswordRequired,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Credentials submitted on the login page.
///
/// Serializes to the `POST /auth/login` body.
#[derive(Clone, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Create a new login form.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check that both fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns the first missing field.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.username.is_empty() {
            return Err(FormError::UsernameRequired);
        }
        if self.password.is_empty() {
            return Err(FormError::PasswordRequired);
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Details submitted on the registration page.
#[derive(Clone)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Create a new registration form.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Validate all fields.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: username presence, username length,
    /// password presence, password length, confirmation match.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.username.is_empty() {
            return Err(FormError::UsernameRequired);
        }
        if self.username.chars().count() < MIN_CREDENTIAL_LENGTH {
            return Err(FormError::UsernameTooShort);
        }
        if self.password.is_empty() {
            return Err(FormError::PasswordRequired);
        }
        if self.password.chars().count() < MIN_CREDENTIAL_LENGTH {
            return Err(FormError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(())
    }

    /// Credentials sent to `POST /auth/register`.
    #[must_use]
    pub fn credentials(&self) -> LoginForm {
        LoginForm::new(self.username.clone(), self.password.clone())
    }
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
