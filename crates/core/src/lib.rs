//! Kirana Core - Shared types library.
//!
//! This crate provides the domain types used across all Kirana components:
//! - `storefront` - Public-facing shop, JSON API and admin product form
//! - `cli` - Command-line tools for catalog seeding and data maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no document
//! store access, no HTTP clients. Cart invariants live here so every component
//! that touches a cart enforces them the same way.
//!
//! # Modules
//!
//! - [`types`] - Validated ids, emails, prices, items, user profiles and carts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
