//! Subcommand implementations.

pub mod account;
pub mod addresses;
pub mod cart;
pub mod catalog;
