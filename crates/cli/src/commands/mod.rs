//! CLI command implementations.
//!
//! Each command drives the storefront through [`AppState`] and prints plain
//! text to stdout.
//!
//! [`AppState`]: quickcart_storefront::state::AppState

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
