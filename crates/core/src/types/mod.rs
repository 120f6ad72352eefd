//! Core types for QKart.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod address;
pub mod id;
pub mod price;
pub mod product;
pub mod session;

pub use address::Address;
pub use id::*;
pub use price::Price;
pub use product::Product;
pub use session::{Session, SessionState};
