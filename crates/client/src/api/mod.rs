//! QKart REST backend client.
//!
//! # Architecture
//!
//! - `reqwest` for HTTP, JSON bodies in both directions
//! - The backend is the source of truth for carts and addresses; nothing is
//!   stored locally except the session
//! - The catalog listing is cached in memory via `moka`; searches always
//!   hit the backend
//!
//! # Example
//!
//! ```rust,ignore
//! use qkart_client::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//!
//! let products = client.get_products().await?;
//! let rackets = client.search_products("racquet").await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::ApiClient;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status}{}", format_message(.message.as_deref()))]
    Api {
        status: u16,
        /// `message` from the `{success: false, message}` body, if any.
        message: Option<String>,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built from the endpoint.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status of a backend rejection.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn format_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(" - {m}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_message() {
        let err = ApiError::Api {
            status: 404,
            message: Some("Product doesn't exist".to_string()),
        };
        assert_eq!(err.to_string(), "API error: 404 - Product doesn't exist");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_api_error_display_without_message() {
        let err = ApiError::Api {
            status: 500,
            message: None,
        };
        assert_eq!(err.to_string(), "API error: 500");
    }
}
