//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::firebase::FirebaseError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] kirana_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Signup without a name.
    #[error("name is required")]
    MissingName,

    /// An account already uses this email.
    #[error("email already registered")]
    EmailExists,

    /// Wrong password or unknown account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account was disabled by an administrator.
    #[error("account disabled")]
    UserDisabled,

    /// The provider is throttling sign-in attempts.
    #[error("too many attempts")]
    TooManyAttempts,

    /// The Google credential was rejected.
    #[error("invalid Google credential")]
    InvalidGoogleCredential,

    /// The provider returned a user ID that is not a valid document ID.
    #[error("invalid user id: {0}")]
    InvalidUid(#[from] kirana_core::IdError),

    /// Profile document operation failed.
    #[error("profile store error: {0}")]
    Repository(#[from] StoreError),

    /// Provider request failed for a reason not listed above.
    #[error("auth provider error: {0}")]
    Provider(#[from] FirebaseError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Translate an Identity Toolkit error message into an error.
    ///
    /// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be
    /// at least 6 characters`; only the code before the colon is matched.
    #[must_use]
    pub fn from_provider_code(message: &str) -> Option<Self> {
        let code = message.split(':').next().unwrap_or_default().trim();
        let err = match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::InvalidCredentials
            }
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "WEAK_PASSWORD" => Self::WeakPassword(
                "Password should be at least 6 characters".to_string(),
            ),
            "INVALID_EMAIL" => Self::InvalidEmail(kirana_core::EmailError::InvalidDomain),
            "INVALID_IDP_RESPONSE" | "INVALID_ID_TOKEN" | "MISSING_OR_INVALID_NONCE" => {
                Self::InvalidGoogleCredential
            }
            _ => return None,
        };
        Some(err)
    }

    /// Message safe to show on the login and signup forms.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::MissingName => "Please enter your name".to_string(),
            Self::EmailExists => "An account with this email already exists".to_string(),
            Self::InvalidCredentials => "Incorrect email or password".to_string(),
            Self::UserDisabled => "This account has been disabled".to_string(),
            Self::TooManyAttempts => {
                "Too many attempts. Please wait a moment and try again".to_string()
            }
            Self::InvalidGoogleCredential => {
                "Google sign-in failed. Please try again".to_string()
            }
            Self::InvalidUid(_)
            | Self::Repository(_)
            | Self::Provider(_)
            | Self::PasswordHash => {
                "Something went wrong. Please try again".to_string()
            }
        }
    }

    /// Whether the error is caused by the backend rather than the user's input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InvalidUid(_) | Self::Repository(_) | Self::Provider(_) | Self::PasswordHash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_code() {
        assert!(matches!(
            AuthError::from_provider_code("EMAIL_EXISTS"),
            Some(AuthError::EmailExists)
        ));
        assert!(matches!(
            AuthError::from_provider_code("INVALID_LOGIN_CREDENTIALS"),
            Some(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            AuthError::from_provider_code(
                "WEAK_PASSWORD : Password should be at least 6 characters"
            ),
            Some(AuthError::WeakPassword(_))
        ));
        assert!(AuthError::from_provider_code("PROJECT_NOT_FOUND").is_none());
    }

    #[test]
    fn test_user_messages_hide_internals() {
        assert_eq!(
            AuthError::EmailExists.user_message(),
            "An account with this email already exists"
        );
        let err = AuthError::Provider(FirebaseError::RateLimited(5));
        assert!(err.is_internal());
        assert!(!err.user_message().contains("Rate limited"));
    }
}
