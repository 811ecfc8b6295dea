//! In-process auth provider for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use kirana_core::{Email, UserId};

use super::{AuthError, AuthIdentity, AuthProvider, hash_password, verify_password};

#[derive(Debug, Clone)]
struct Account {
    uid: UserId,
    /// `None` for accounts created through Google.
    password_hash: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
struct GoogleIdentity {
    email: Email,
    display_name: Option<String>,
}

/// Auth provider keeping accounts in memory.
///
/// Passwords are stored as Argon2id hashes. Google sign-in only accepts ID
/// tokens registered with [`Self::with_google_identity`].
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    accounts: RwLock<HashMap<Email, Account>>,
    google: HashMap<String, GoogleIdentity>,
}

impl MemoryAuthProvider {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `id_token` as a Google credential for `email`.
    #[must_use]
    pub fn with_google_identity(
        mut self,
        id_token: impl Into<String>,
        email: Email,
        display_name: Option<String>,
    ) -> Self {
        self.google.insert(
            id_token.into(),
            GoogleIdentity {
                email,
                display_name,
            },
        );
        self
    }
}

fn new_uid() -> Result<UserId, AuthError> {
    Ok(UserId::parse(&Uuid::new_v4().simple().to_string())?)
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError> {
        let password_hash = hash_password(password)?;
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailExists);
        }
        let uid = new_uid()?;
        accounts.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                password_hash: Some(password_hash),
                display_name: None,
            },
        );
        Ok(AuthIdentity {
            uid,
            email: email.clone(),
            display_name: None,
        })
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError> {
        let account = self
            .accounts
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = account
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        Ok(AuthIdentity {
            uid: account.uid,
            email: email.clone(),
            display_name: account.display_name,
        })
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthIdentity, AuthError> {
        let google = self
            .google
            .get(id_token)
            .ok_or(AuthError::InvalidGoogleCredential)?;

        let mut accounts = self.accounts.write().await;
        let account = match accounts.get(&google.email) {
            Some(account) => account.clone(),
            None => {
                let account = Account {
                    uid: new_uid()?,
                    password_hash: None,
                    display_name: google.display_name.clone(),
                };
                accounts.insert(google.email.clone(), account.clone());
                account
            }
        };

        Ok(AuthIdentity {
            uid: account.uid,
            email: google.email.clone(),
            display_name: account.display_name.or_else(|| google.display_name.clone()),
        })
    }
}
