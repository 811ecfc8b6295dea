//! Core types for Kirana.
//!
//! This module provides type-safe wrappers for the storefront's documents.

pub mod cart;
pub mod email;
pub mod id;
pub mod item;
pub mod price;
pub mod user;

pub use cart::{Cart, CartError, CartLine, CartTotals, Quantity, QuantityError};
pub use email::{Email, EmailError};
pub use id::*;
pub use item::{Item, ItemError, NewItem, split_list};
pub use price::{CurrencyCode, Price};
pub use user::UserProfile;
