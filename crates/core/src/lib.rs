//! quickcart Core - Shared types library.
//!
//! This crate provides common types used across all quickcart components:
//! - `storefront` - Session and cart stores, checkout, webhook clients
//! - `cli` - The `quickcart` command-line shell
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, products, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
