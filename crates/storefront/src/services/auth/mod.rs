//! Authentication service.
//!
//! Identity is owned by the auth provider ([`AuthProvider`]); the storefront
//! keeps a profile document per user at `users/{uid}` holding the name and
//! the cart. [`AuthService`] validates form input, calls the provider, and
//! makes sure a profile exists after every successful sign-in.

mod error;
mod memory;

pub use error::AuthError;
pub use memory::MemoryAuthProvider;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::Utc;

use kirana_core::{Email, UserId, UserProfile};

use crate::db::{DocumentStore, StoreError, UserRepository};

/// Minimum password length accepted by the auth provider.
const MIN_PASSWORD_LENGTH: usize = 6;

/// A user as identified by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub uid: UserId,
    pub email: Email,
    /// Name from the identity provider (Google profiles carry one).
    pub display_name: Option<String>,
}

/// Hosted identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an email/password account.
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError>;

    /// Check an email/password pair.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError>;

    /// Exchange a Google ID token for an identity, creating the account on
    /// first use.
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthIdentity, AuthError>;
}

/// Authentication service.
///
/// Handles signup, password login and Google login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    provider: &'a dyn AuthProvider,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, provider: &'a dyn AuthProvider) -> Self {
        Self {
            users: UserRepository::new(store),
            provider,
        }
    }

    /// Register a new user and create their profile with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for bad input, `AuthError::EmailExists` if
    /// the email is taken, or a backend error.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let identity = self.provider.sign_up(&email, password).await?;
        let profile = UserProfile::new(
            identity.uid,
            identity.email,
            Some(name.to_string()),
            Utc::now(),
        );
        self.users.create(&profile).await?;

        tracing::info!(user_id = %profile.id, "User signed up");
        Ok(profile)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = self.provider.sign_in(&email, password).await?;
        self.ensure_profile(identity).await
    }

    /// Login with a Google ID token, creating the profile on first login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidGoogleCredential` if the token is rejected.
    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<UserProfile, AuthError> {
        if id_token.trim().is_empty() {
            return Err(AuthError::InvalidGoogleCredential);
        }
        let identity = self.provider.sign_in_with_google(id_token).await?;
        self.ensure_profile(identity).await
    }

    /// Load the user's profile, creating it if the account has none yet.
    async fn ensure_profile(&self, identity: AuthIdentity) -> Result<UserProfile, AuthError> {
        if let Some(existing) = self.users.get(&identity.uid).await? {
            return Ok(existing.value);
        }

        let profile = UserProfile::new(
            identity.uid,
            identity.email,
            identity.display_name,
            Utc::now(),
        );
        match self.users.create(&profile).await {
            Ok(_) => {
                tracing::info!(user_id = %profile.id, "Created profile on first sign-in");
                Ok(profile)
            }
            // Another request created it first
            Err(StoreError::AlreadyExists(_)) => self
                .users
                .get(&profile.id)
                .await?
                .map(|v| v.value)
                .ok_or_else(|| AuthError::Repository(StoreError::NotFound(profile.id.to_string()))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password should be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{Collection, MemoryStore};

    fn provider() -> MemoryAuthProvider {
        MemoryAuthProvider::new().with_google_identity(
            "google-token-ravi",
            Email::parse("ravi@gmail.com").unwrap(),
            Some("Ravi Kumar".to_string()),
        )
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("chai-time").unwrap();
        assert!(verify_password("chai-time", &hash).is_ok());
        assert!(matches!(
            verify_password("coffee", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_with_empty_cart() {
        let store = MemoryStore::new();
        let provider = provider();
        let auth = AuthService::new(&store, &provider);

        let profile = auth
            .sign_up(" Asha ", "Asha@Kirana.shop", "secret-pass")
            .await
            .unwrap();
        assert_eq!(profile.name.as_deref(), Some("Asha"));
        assert_eq!(profile.email.as_str(), "asha@kirana.shop");

        let doc = store
            .get(Collection::Users, profile.id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields["name"], "Asha");
        assert_eq!(doc.fields["cart"], serde_json::json!([]));
        assert!(doc.fields.contains_key("createdAt"));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let store = MemoryStore::new();
        let provider = provider();
        let auth = AuthService::new(&store, &provider);

        assert!(matches!(
            auth.sign_up("", "a@b.co", "123456").await,
            Err(AuthError::MissingName)
        ));
        assert!(matches!(
            auth.sign_up("A", "nope", "123456").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.sign_up("A", "a@b.co", "123").await,
            Err(AuthError::WeakPassword(_))
        ));

        auth.sign_up("A", "a@b.co", "123456").await.unwrap();
        assert!(matches!(
            auth.sign_up("B", "A@b.co", "654321").await,
            Err(AuthError::EmailExists)
        ));
    }

    #[tokio::test]
    async fn test_sign_in() {
        let store = MemoryStore::new();
        let provider = provider();
        let auth = AuthService::new(&store, &provider);
        let created = auth.sign_up("Asha", "asha@kirana.shop", "123456").await.unwrap();

        let profile = auth.sign_in("asha@kirana.shop", "123456").await.unwrap();
        assert_eq!(profile.id, created.id);

        assert!(matches!(
            auth.sign_in("asha@kirana.shop", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("nobody@kirana.shop", "123456").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_google_sign_in_creates_profile_once() {
        let store = MemoryStore::new();
        let provider = provider();
        let auth = AuthService::new(&store, &provider);

        let first = auth.sign_in_with_google("google-token-ravi").await.unwrap();
        assert_eq!(first.name.as_deref(), Some("Ravi Kumar"));

        let second = auth.sign_in_with_google("google-token-ravi").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list(Collection::Users).await.unwrap().len(), 1);

        assert!(matches!(
            auth.sign_in_with_google("forged").await,
            Err(AuthError::InvalidGoogleCredential)
        ));
    }
}
