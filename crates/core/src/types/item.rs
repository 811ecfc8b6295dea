//! Product records stored in the `items` collection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ItemId;
use super::price::Price;

/// Errors raised when validating a new item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// Title is empty after trimming.
    #[error("title cannot be empty")]
    EmptyTitle,
    /// Price is below zero.
    #[error("price cannot be negative")]
    NegativePrice,
    /// Original price is lower than the selling price.
    #[error("original price must not be lower than the price")]
    OriginalPriceBelowPrice,
}

/// A product in the catalog.
///
/// Field names follow the stored document shape (`camelCase`). Missing
/// optional fields in older documents decode to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Document ID, also the admin-entered SKU.
    pub id: ItemId,
    pub title: String,
    /// Selling price in the default currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Price before discount, when the item is on sale.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub product_details: String,
    #[serde(default)]
    pub delivery: String,
    #[serde(default)]
    pub color: Vec<String>,
    #[serde(default)]
    pub size: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Download URLs of the uploaded product images.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Selling price with currency.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::in_default_currency(self.price)
    }

    /// Discount per unit; zero when there is no (higher) original price.
    #[must_use]
    pub fn unit_discount(&self) -> Decimal {
        self.original_price
            .map_or(Decimal::ZERO, |original| (original - self.price).max(Decimal::ZERO))
    }

    /// Whole-number discount percentage, if the item is discounted.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= Decimal::ZERO || original <= self.price {
            return None;
        }
        let percent = (original - self.price) * Decimal::ONE_HUNDRED / original;
        percent.round().to_string().parse().ok()
    }

    /// First image URL, used as the listing thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Input for creating an item through the admin form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub id: ItemId,
    pub title: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub tagline: String,
    pub product_details: String,
    pub delivery: String,
    pub color: Vec<String>,
    pub size: Vec<String>,
    pub tags: Vec<String>,
}

impl NewItem {
    /// Check the field rules and normalize whitespace and list duplicates.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemError`] for an empty title, a negative price, or an
    /// original price below the selling price.
    pub fn validate(mut self) -> Result<Self, ItemError> {
        self.title = self.title.trim().to_owned();
        if self.title.is_empty() {
            return Err(ItemError::EmptyTitle);
        }
        if self.price < Decimal::ZERO {
            return Err(ItemError::NegativePrice);
        }
        if let Some(original) = self.original_price
            && original < self.price
        {
            return Err(ItemError::OriginalPriceBelowPrice);
        }
        self.tagline = self.tagline.trim().to_owned();
        self.product_details = self.product_details.trim().to_owned();
        self.delivery = self.delivery.trim().to_owned();
        self.color = dedupe(self.color);
        self.size = dedupe(self.size);
        self.tags = dedupe(self.tags);
        Ok(self)
    }

    /// Build the stored item once images are uploaded.
    #[must_use]
    pub fn into_item(self, images: Vec<String>, created_at: DateTime<Utc>) -> Item {
        Item {
            id: self.id,
            title: self.title,
            price: self.price,
            original_price: self.original_price,
            rating: 0.0,
            rating_count: 0,
            review_count: 0,
            tagline: self.tagline,
            product_details: self.product_details,
            delivery: self.delivery,
            color: self.color,
            size: self.size,
            tags: self.tags,
            images,
            created_at: Some(created_at),
        }
    }
}

/// Split a comma separated form value into trimmed, non-empty, unique entries.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    dedupe(raw.split(',').map(str::to_owned).collect())
}

fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_owned());
        }
    }
    out
}
