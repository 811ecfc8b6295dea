//! Request-scoped models for storefront.
//!
//! Persistent domain types live in `kirana-core`; this module holds what the
//! storefront keeps in the session.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
