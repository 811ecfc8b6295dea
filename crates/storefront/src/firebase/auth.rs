//! Firebase Auth (Identity Toolkit REST) implementation of [`AuthProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kirana_core::{Email, UserId};

use super::{FirebaseClient, FirebaseError};
use crate::services::auth::{AuthError, AuthIdentity, AuthProvider};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl AccountResponse {
    fn into_identity(self) -> Result<AuthIdentity, AuthError> {
        Ok(AuthIdentity {
            uid: UserId::parse(&self.local_id)?,
            email: Email::parse(&self.email)?,
            display_name: self.display_name.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Auth provider backed by Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: FirebaseClient,
    /// Origin sent as `requestUri` for IdP sign-in.
    request_uri: String,
}

impl FirebaseAuth {
    /// Create a provider using the shared Firebase client.
    #[must_use]
    pub fn new(client: FirebaseClient, base_url: &str) -> Self {
        Self {
            client,
            request_uri: base_url.to_string(),
        }
    }

    async fn call<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<AuthIdentity, AuthError> {
        let request = self
            .client
            .http()
            .post(format!("{}/accounts:{endpoint}", self.client.auth_base()))
            .query(&[("key", self.client.api_key())])
            .json(body);

        match self.client.execute_json::<AccountResponse>(request).await {
            Ok(account) => account.into_identity(),
            Err(e) => {
                let translated = match &e {
                    FirebaseError::Api { message, .. } => AuthError::from_provider_code(message),
                    _ => None,
                };
                Err(translated.unwrap_or_else(|| e.into()))
            }
        }
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError> {
        self.call(
            "signUp",
            &PasswordRequest {
                email: email.as_str(),
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError> {
        self.call(
            "signInWithPassword",
            &PasswordRequest {
                email: email.as_str(),
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    #[instrument(skip_all)]
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthIdentity, AuthError> {
        let post_body = format!(
            "id_token={}&providerId=google.com",
            urlencoding::encode(id_token)
        );
        self.call(
            "signInWithIdp",
            &IdpRequest {
                post_body,
                request_uri: &self.request_uri,
                return_idp_credential: true,
                return_secure_token: true,
            },
        )
        .await
    }
}
