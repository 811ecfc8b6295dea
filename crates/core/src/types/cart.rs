//! Shopping cart embedded in each user document.
//!
//! A [`Cart`] keeps one line per item with a quantity of at least one. Carts
//! read from older documents may hold repeated lines for the same item; these
//! are merged on load so the invariant holds for every cart in memory.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ItemId;
use super::item::Item;

/// Errors raised when constructing a [`Quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be at least 1")]
    TooSmall,
    /// Quantity above [`Quantity::MAX`].
    #[error("quantity must be at most {}", Quantity::MAX)]
    TooLarge,
}

/// Line quantity, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Largest quantity a single line may hold.
    pub const MAX: u32 = 999;

    /// Create a quantity from a signed value.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is below 1 or above [`Self::MAX`].
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::TooSmall);
        }
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge)
    }

    /// The quantity as an integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The quantity plus `other`, capped at [`Self::MAX`].
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0).min(Self::MAX))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl From<Quantity> for Decimal {
    fn from(q: Quantity) -> Self {
        Self::from(q.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The item has no line in this cart.
    #[error("item {0} is not in the cart")]
    NotInCart(ItemId),
}

/// One cart entry as stored in the user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: ItemId,
    pub quantity: Quantity,
}

/// A line as found in stored documents, before cart invariants are applied.
///
/// Quantities may be missing (read as 1) or non-positive (dropped on load).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartLine {
    pub item_id: ItemId,
    #[serde(default = "default_raw_quantity")]
    pub quantity: i64,
}

const fn default_raw_quantity() -> i64 {
    1
}

/// A user's cart: unique item lines in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RawCartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from lines, merging repeated items.
    ///
    /// The merged line keeps the position of the first occurrence and the sum
    /// of the quantities.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.add_quantity(line.item_id, line.quantity);
        }
        cart
    }

    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity.get()).sum()
    }

    /// Quantity held for an item, if present.
    #[must_use]
    pub fn quantity_of(&self, item_id: &ItemId) -> Option<Quantity> {
        self.lines
            .iter()
            .find(|l| &l.item_id == item_id)
            .map(|l| l.quantity)
    }

    /// Add one unit of an item, returning the line's new quantity.
    pub fn add(&mut self, item_id: ItemId) -> Quantity {
        self.add_quantity(item_id, Quantity::ONE)
    }

    /// Add units of an item, incrementing an existing line.
    pub fn add_quantity(&mut self, item_id: ItemId, quantity: Quantity) -> Quantity {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return line.quantity;
        }
        self.lines.push(CartLine { item_id, quantity });
        quantity
    }

    /// Remove an item's line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] and leaves the cart untouched if the
    /// item has no line.
    pub fn remove(&mut self, item_id: &ItemId) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|l| &l.item_id == item_id)
            .ok_or_else(|| CartError::NotInCart(item_id.clone()))?;
        Ok(self.lines.remove(index))
    }

    /// Replace the quantity of an existing line.
    ///
    /// Returns `false` without creating a line when the item is absent.
    pub fn set_quantity(&mut self, item_id: &ItemId, quantity: Quantity) -> bool {
        match self.lines.iter_mut().find(|l| &l.item_id == item_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }
}

impl From<Vec<RawCartLine>> for Cart {
    fn from(raw: Vec<RawCartLine>) -> Self {
        // Lines with non-positive quantities are dropped.
        Self::from_lines(raw.into_iter().filter_map(|line| {
            Quantity::new(line.quantity.min(i64::from(Quantity::MAX)))
                .ok()
                .map(|quantity| CartLine {
                    item_id: line.item_id,
                    quantity,
                })
        }))
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

/// Price totals for a cart page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    /// Σ price × quantity.
    pub total_price: Decimal,
    /// Σ (original price − price) × quantity.
    pub total_discount: Decimal,
    /// Σ quantity.
    pub item_count: u32,
}

impl CartTotals {
    /// Compute totals over resolved cart lines.
    #[must_use]
    pub fn compute<'a>(lines: impl IntoIterator<Item = (&'a Item, Quantity)>) -> Self {
        lines
            .into_iter()
            .fold(Self::default(), |mut totals, (item, quantity)| {
                let units = Decimal::from(quantity);
                totals.total_price += item.price * units;
                totals.total_discount += item.unit_discount() * units;
                totals.item_count += quantity.get();
                totals
            })
    }

    /// Price before discounts (`total_price + total_discount`).
    #[must_use]
    pub fn total_before_discount(&self) -> Decimal {
        self.total_price + self.total_discount
    }
}
