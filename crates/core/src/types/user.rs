//! User profiles stored in the `users` collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::email::Email;
use super::id::UserId;

/// A user's profile document, keyed by the auth provider's uid.
///
/// Profiles written before carts existed have no `cart` field; it decodes as
/// an empty cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cart: Cart,
}

impl UserProfile {
    /// A fresh profile with an empty cart.
    #[must_use]
    pub fn new(
        id: UserId,
        email: Email,
        name: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name,
            created_at: Some(created_at),
            cart: Cart::new(),
        }
    }

    /// Name to greet the user with, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }
}
