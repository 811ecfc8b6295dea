//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use kirana_core::{Email, UserId, UserProfile};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth provider uid, also the profile document ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Name from the profile, if one was given.
    pub name: Option<String>,
}

impl CurrentUser {
    /// Name to greet the user with, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }
}

impl From<&UserProfile> for CurrentUser {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for a one-shot message shown on the next page render.
    pub const FLASH: &str = "flash";
}
