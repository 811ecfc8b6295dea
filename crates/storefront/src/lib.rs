//! Kirana Storefront library.
//!
//! This crate provides the storefront functionality as a library, so the
//! binary, the CLI and the integration tests share one router and one set of
//! backend clients.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod firebase;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
