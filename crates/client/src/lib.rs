//! QKart client library.
//!
//! Everything the storefront does that touches the outside world: talking to
//! the REST backend, remembering who is logged in, and debouncing search
//! input. The [`Storefront`] facade ties these together for front ends.
//!
//! # Example
//!
//! ```rust,ignore
//! use qkart_client::{ClientConfig, Storefront};
//! use qkart_core::LoginForm;
//!
//! let config = ClientConfig::from_env()?;
//! let storefront = Storefront::from_config(&config)?;
//!
//! storefront.login(&LoginForm::new("criodo", "learnbydoing")).await?;
//! let cart = storefront.cart().await?;
//! println!("Order total: {}", cart.total);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod search;
pub mod session;
pub mod storefront;

pub use api::{ApiClient, ApiError};
pub use config::{ApiConfig, ClientConfig, ConfigError};
pub use error::{AppError, Result};
pub use search::{ProductSearch, SearchDebouncer, SearchOutcome, SearchUpdate};
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionStore, StorageError};
pub use storefront::{AddOptions, Storefront};
