//! Client-held authentication state.
//!
//! A [`Session`] is created on successful login and destroyed on logout.
//! There is no expiry: the token is trusted until the backend rejects it.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

use super::Price;

/// Storage keys for the persisted session fields.
pub mod keys {
    /// Key for the logged-in username.
    pub const USERNAME: &str = "username";

    /// Key for the bearer token used on protected routes.
    pub const TOKEN: &str = "token";

    /// Key for the wallet balance.
    pub const BALANCE: &str = "balance";

    /// All keys written by a login, in write order.
    pub const ALL: [&str; 3] = [USERNAME, TOKEN, BALANCE];
}

/// The current authenticated user.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    /// Username the user logged in as.
    pub username: String,
    /// Bearer token for authenticated requests.
    pub token: SecretString,
    /// Wallet balance at login, updated after checkout.
    pub balance: Price,
}

impl Session {
    /// Create a new session.
    #[must_use]
    pub fn new(username: impl Into<String>, token: impl Into<String>, balance: Price) -> Self {
        Self {
            username: username.into(),
            token: SecretString::from(token.into()),
            balance,
        }
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .field("balance", &self.balance)
            .finish()
    }
}

/// Per-client login state.
///
/// `LoggedOut -> LoggedIn` on persist after authentication,
/// `LoggedIn -> LoggedOut` on explicit logout. Nothing else.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn(Session),
}

impl SessionState {
    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }

    /// The session, if logged in.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::LoggedIn(session) => Some(session),
            Self::LoggedOut => None,
        }
    }
}

impl From<Option<Session>> for SessionState {
    fn from(session: Option<Session>) -> Self {
        session.map_or(Self::LoggedOut, Self::LoggedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("criodo", "super_secret_token", Price::new(5000));
        let debug_output = format!("{session:?}");

        assert!(debug_output.contains("criodo"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }

    #[test]
    fn test_bearer_header() {
        let session = Session::new("criodo", "testtoken", Price::ZERO);
        assert_eq!(session.bearer(), "Bearer testtoken");
    }

    #[test]
    fn test_state_from_option() {
        assert!(!SessionState::from(None).is_logged_in());

        let state = SessionState::from(Some(Session::new("criodo", "t", Price::ZERO)));
        assert!(state.is_logged_in());
        assert_eq!(state.session().map(|s| s.username.as_str()), Some("criodo"));
    }
}
