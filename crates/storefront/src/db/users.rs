//! User profile repository.
//!
//! Profiles live at `users/{uid}` where `uid` is the auth provider's user ID.
//! The cart is embedded in the profile and written on its own so that a cart
//! write never clobbers concurrent profile edits.

use kirana_core::{Cart, UserId, UserProfile};
use super::{
    Collection, DocumentStore, Fields, Revision, StoreError, Versioned, from_document, to_fields,
};

/// Repository for user profile documents.
pub struct UserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get a profile and the revision it was read at.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Decode` if the stored document is malformed, or a
    /// backend error.
    pub async fn get(&self, id: &UserId) -> Result<Option<Versioned<UserProfile>>, StoreError> {
        let Some(document) = self.store.get(Collection::Users, id.as_str()).await? else {
            return Ok(None);
        };
        let revision = document.revision.clone();
        let value = from_document(Collection::Users, document)?;
        Ok(Some(Versioned { value, revision }))
    }

    /// Create a profile document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if a profile exists for the user.
    pub async fn create(&self, profile: &UserProfile) -> Result<Revision, StoreError> {
        let fields = to_fields(profile)?;
        let document = self
            .store
            .create(Collection::Users, profile.id.as_str(), fields)
            .await?;
        Ok(document.revision)
    }

    /// Replace the `cart` field only.
    ///
    /// With `expected` set, the write fails with `StoreError::Conflict` if the
    /// profile changed since it was read.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the profile is missing,
    /// `StoreError::Conflict` on a stale revision, or a backend error.
    pub async fn update_cart(
        &self,
        id: &UserId,
        cart: &Cart,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        let cart = serde_json::to_value(cart).map_err(|e| StoreError::Encode(e.to_string()))?;
        let mut fields = Fields::new();
        fields.insert("cart".to_owned(), cart);

        let document = self
            .store
            .update(Collection::Users, id.as_str(), fields, expected)
            .await?;
        Ok(document.revision)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use kirana_core::{Email, ItemId};
    use serde_json::json;

    use super::*;
    use crate::db::MemoryStore;

    fn profile(uid: &str) -> UserProfile {
        UserProfile::new(
            UserId::parse(uid).unwrap(),
            Email::parse("asha@kirana.shop").unwrap(),
            Some("Asha".to_owned()),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let users = UserRepository::new(&store);
        users.create(&profile("u1")).await.unwrap();

        let found = users.get(&UserId::parse("u1").unwrap()).await.unwrap().unwrap();
        assert_eq!(found.value.name.as_deref(), Some("Asha"));
        assert!(found.value.cart.is_empty());

        let stored = store.get(Collection::Users, "u1").await.unwrap().unwrap();
        assert!(!stored.fields.contains_key("id"));
        assert_eq!(stored.fields["cart"], json!([]));
    }

    #[tokio::test]
    async fn test_update_cart_keeps_profile_fields() {
        let store = MemoryStore::new();
        let users = UserRepository::new(&store);
        let uid = UserId::parse("u1").unwrap();
        let revision = users.create(&profile("u1")).await.unwrap();

        let mut cart = Cart::new();
        cart.add(ItemId::parse("sku1").unwrap());
        users.update_cart(&uid, &cart, Some(&revision)).await.unwrap();

        let found = users.get(&uid).await.unwrap().unwrap();
        assert_eq!(found.value.email.as_str(), "asha@kirana.shop");
        assert_eq!(found.value.cart, cart);

        let err = users
            .update_cart(&uid, &Cart::new(), Some(&revision))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
