//! Unified error handling with Sentry integration.
//!
//! Every storefront action returns `Result<T, AppError>`. Errors are terminal
//! for the triggering action only: front ends show [`AppError::user_message`]
//! as a transient notification and return to their previous state.

use thiserror::Error;

use qkart_core::{CheckoutError, FormError};

use crate::api::ApiError;
use crate::session::StorageError;

/// Shown when the backend cannot be reached or answers with garbage.
pub const CONNECTIVITY_MESSAGE: &str = "Could not fetch products. Check that the backend is running, reachable and returns valid JSON.";

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected locally; no request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend failed (5xx) or could not be reached.
    #[error("Server error: {}", .0.as_deref().unwrap_or("unreachable"))]
    Server(Option<String>),

    /// Credentials rejected on login or registration.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No session, or the backend rejected the token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Session storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Map a failed login or registration call.
    ///
    /// A 400 carries the backend's explanation ("Password is incorrect"),
    /// which is surfaced verbatim.
    #[must_use]
    pub fn from_auth_failure(err: ApiError) -> Self {
        match err {
            ApiError::Api {
                status: 400,
                message,
            } => Self::Auth(message.unwrap_or_else(|| "Invalid username or password".to_string())),
            other => other.into(),
        }
    }

    /// Text for the transient notification shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Server(Some(message)) => message.clone(),
            Self::Server(None) => CONNECTIVITY_MESSAGE.to_string(),
            Self::Storage(err) => format!("Could not access the saved session: {err}"),
            Self::Validation(message)
            | Self::Auth(message)
            | Self::NotFound(message)
            | Self::Unauthorized(message)
            | Self::BadRequest(message) => message.clone(),
        }
    }

    /// Whether the user should log in again before retrying.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Log the error, capturing server-side failures to Sentry.
    pub fn report(&self) {
        if matches!(self, Self::Server(_) | Self::Storage(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront action failed"
            );
        } else {
            tracing::warn!(error = %self, "Storefront action rejected");
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(_) | ApiError::Parse(_) | ApiError::InvalidEndpoint(_) => {
                Self::Server(None)
            }
            ApiError::Api { status, message } => match status {
                400 => Self::BadRequest(message.unwrap_or_else(|| "Bad request".to_string())),
                401 | 403 => Self::Unauthorized(
                    message.unwrap_or_else(|| "Please log in again to continue".to_string()),
                ),
                404 => Self::NotFound(message.unwrap_or_else(|| "Not found".to_string())),
                500..=599 => Self::Server(message),
                _ => Self::BadRequest(message.unwrap_or_else(|| format!("HTTP {status}"))),
            },
        }
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after login.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "KCRwjF7lN97HnEaY")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: Option<&str>) -> ApiError {
        ApiError::Api {
            status,
            message: message.map(String::from),
        }
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Server(None);
        assert_eq!(err.to_string(), "Server error: unreachable");
    }

    #[test]
    fn test_server_error_surfaces_body_message() {
        let err = AppError::from(api(
            500,
            Some("Something went wrong. Check the backend console for more details"),
        ));
        assert_eq!(
            err.user_message(),
            "Something went wrong. Check the backend console for more details"
        );
    }

    #[test]
    fn test_server_error_without_message_is_generic() {
        let err = AppError::from(api(503, None));
        assert_eq!(err.user_message(), CONNECTIVITY_MESSAGE);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            AppError::from(api(404, Some("Product doesn't exist"))),
            AppError::NotFound(m) if m == "Product doesn't exist"
        ));
        assert!(AppError::from(api(401, None)).requires_login());
        assert!(matches!(
            AppError::from(api(400, Some("bad"))),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(api(409, None)),
            AppError::BadRequest(m) if m == "HTTP 409"
        ));
    }

    #[test]
    fn test_auth_failure_verbatim() {
        let err = AppError::from_auth_failure(api(400, Some("Password is incorrect")));
        assert!(matches!(&err, AppError::Auth(_)));
        assert_eq!(err.user_message(), "Password is incorrect");
    }

    #[test]
    fn test_auth_failure_non_400_falls_through() {
        let err = AppError::from_auth_failure(api(500, None));
        assert!(matches!(err, AppError::Server(None)));
    }

    #[test]
    fn test_validation_from_form_error() {
        let err = AppError::from(FormError::UsernameRequired);
        assert_eq!(err.user_message(), "Username is a required field");
    }

    #[test]
    fn test_validation_from_checkout_error() {
        let err = AppError::from(CheckoutError::NoAddressSelected);
        assert_eq!(
            err.user_message(),
            "Please select one shipping address to proceed."
        );
    }
}
