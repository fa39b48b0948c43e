//! Quickcart storefront library.
//!
//! Client-side storefront state: a simulated session, a persistent cart,
//! checkout, and product search. Search and order processing are delegated
//! to external webhooks. Views drive everything through [`state::AppState`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod webhook;
