//! QKart Core - Domain types and cart computations.
//!
//! This crate provides the types shared by every QKart client component:
//! - `client` - REST client, session persistence, debounced search
//! - `cli` - Command-line storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. Everything here can be tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, products, sessions, addresses
//! - [`cart`] - Joining the server cart against the catalog and valuing it
//! - [`checkout`] - Pre-flight checks run before placing an order
//! - [`forms`] - Login and registration form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod forms;
pub mod types;

pub use cart::{CartEntry, CartLineItem, CartView};
pub use checkout::{ApprovedCheckout, CheckoutError};
pub use forms::{FormError, LoginForm, RegisterForm};
pub use types::*;
