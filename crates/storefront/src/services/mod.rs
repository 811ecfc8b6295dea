//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Email/password and Google sign-in, profile creation
//! - `cart` - Cart mutations with conditional writes, cart page view
//! - `catalog` - Cached item listing and admin item creation
//! - `search` - Substring search and suggestions over the item list

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod search;

pub use auth::{AuthError, AuthIdentity, AuthProvider, AuthService, MemoryAuthProvider};
pub use cart::{CartAction, CartService, CartServiceError, CartView};
pub use catalog::{CatalogError, CatalogService, ImageUpload};
