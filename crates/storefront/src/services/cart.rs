//! Cart mutations and the cart page view.
//!
//! Mutations read the user's profile, apply the action to the embedded cart
//! and write the `cart` field back conditioned on the revision that was read.
//! A stale revision means another request changed the profile in between, in
//! which case the read-modify-write is repeated.

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use kirana_core::{Cart, CartError, CartTotals, Item, ItemId, Quantity, UserId};

use crate::db::{DocumentStore, ItemRepository, StoreError, UserRepository};

/// Attempts made before a contended cart write gives up.
pub const MAX_CART_WRITE_ATTEMPTS: usize = 5;

/// A cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit of the item.
    Add,
    /// Remove the item's line.
    Remove,
    /// Replace the quantity of an existing line.
    Update(Quantity),
}

impl CartAction {
    /// Message returned to the client after a successful mutation.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Add => "Item added to cart",
            Self::Remove => "Item removed from cart",
            Self::Update(_) => "Cart updated",
        }
    }
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// No profile document for the user.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The item does not exist in the catalog.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// The item has no line in the cart.
    #[error(transparent)]
    NotInCart(#[from] CartError),

    /// Concurrent writers kept invalidating the revision.
    #[error("cart for user {0} is being modified concurrently")]
    Conflict(UserId),

    /// Document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A cart line joined with its item.
#[derive(Debug, Clone)]
pub struct CartEntry {
    pub item: Item,
    pub quantity: Quantity,
}

impl CartEntry {
    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.item.price * Decimal::from(self.quantity)
    }
}

/// A cart ready for display.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub entries: Vec<CartEntry>,
    pub totals: CartTotals,
}

/// Cart service.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn DocumentStore>,
}

impl CartService {
    /// Create a cart service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Apply `action` for `item_id` to the user's cart and return the cart as
    /// written.
    ///
    /// `Update` on an item that is not in the cart leaves the cart unchanged
    /// and performs no write.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `ItemNotFound` (on add), `NotInCart` (on
    /// remove), `Conflict` once [`MAX_CART_WRITE_ATTEMPTS`] writes were
    /// rejected as stale, or a store failure.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn apply(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
        action: CartAction,
    ) -> Result<Cart, CartServiceError> {
        if action == CartAction::Add
            && ItemRepository::new(&*self.store)
                .get(item_id)
                .await?
                .is_none()
        {
            return Err(CartServiceError::ItemNotFound(item_id.clone()));
        }

        let users = UserRepository::new(&*self.store);

        for attempt in 1..=MAX_CART_WRITE_ATTEMPTS {
            let profile = users
                .get(user_id)
                .await?
                .ok_or_else(|| CartServiceError::UserNotFound(user_id.clone()))?;
            let mut cart = profile.value.cart;

            match action {
                CartAction::Add => {
                    cart.add(item_id.clone());
                }
                CartAction::Remove => {
                    cart.remove(item_id)?;
                }
                CartAction::Update(quantity) => {
                    if !cart.set_quantity(item_id, quantity) {
                        tracing::debug!("Update for item not in cart; nothing to write");
                        return Ok(cart);
                    }
                }
            }

            match users
                .update_cart(user_id, &cart, Some(&profile.revision))
                .await
            {
                Ok(_) => return Ok(cart),
                Err(StoreError::Conflict(_)) => {
                    tracing::debug!(attempt, "Cart write lost a race, retrying");
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(CartServiceError::UserNotFound(user_id.clone()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            attempts = MAX_CART_WRITE_ATTEMPTS,
            "Giving up on contended cart write"
        );
        Err(CartServiceError::Conflict(user_id.clone()))
    }

    /// The user's cart joined with catalog items.
    ///
    /// Lines whose item no longer exists, or whose document no longer decodes,
    /// are left out of the view and the totals.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or a store failure.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn view(&self, user_id: &UserId) -> Result<CartView, CartServiceError> {
        let profile = UserRepository::new(&*self.store)
            .get(user_id)
            .await?
            .ok_or_else(|| CartServiceError::UserNotFound(user_id.clone()))?;
        let cart = profile.value.cart;

        let items = ItemRepository::new(&*self.store);
        let lookups = cart.lines().iter().map(|line| items.get(&line.item_id));
        let results = join_all(lookups).await;

        let mut entries = Vec::with_capacity(cart.len());
        for (line, result) in cart.lines().iter().zip(results) {
            match result {
                Ok(Some(item)) => entries.push(CartEntry {
                    item,
                    quantity: line.quantity,
                }),
                Ok(None) => {
                    tracing::debug!(item_id = %line.item_id, "Skipping cart line for missing item");
                }
                Err(StoreError::Decode { path, source }) => {
                    tracing::warn!(%path, error = %source, "Skipping cart line for malformed item");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let totals = CartTotals::compute(entries.iter().map(|e| (&e.item, e.quantity)));
        Ok(CartView { entries, totals })
    }
}
