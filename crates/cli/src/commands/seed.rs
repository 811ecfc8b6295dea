//! Seed the catalog from a YAML file.
//!
//! The file is a list of items in the stored field shape:
//!
//! ```yaml
//! - itemId: kurta-01
//!   title: Cotton Kurta
//!   price: 799
//!   originalPrice: 1199
//!   tags: [ethnic, summer]
//!   images:
//!     - https://cdn.kirana.shop/kurta-01/front.jpg
//! ```
//!
//! Images are referenced by URL; nothing is uploaded. Items whose ID already
//! exists are skipped, so the command can be re-run safely.

use std::path::Path;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info, warn};

use kirana_core::{Item, ItemError, ItemId, NewItem};
use kirana_storefront::db::{DocumentStore, ItemRepository, StoreError};

/// One item as written in the seed file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedItem {
    pub item_id: ItemId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
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
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub review_count: u32,
}

impl SeedItem {
    /// Validate and build the stored item.
    ///
    /// # Errors
    ///
    /// Returns the same [`ItemError`] the admin form would.
    pub fn into_item(self) -> Result<Item, ItemError> {
        let new_item = NewItem {
            id: self.item_id,
            title: self.title,
            price: self.price,
            original_price: self.original_price,
            tagline: self.tagline,
            product_details: self.product_details,
            delivery: self.delivery,
            color: self.color,
            size: self.size,
            tags: self.tags,
        }
        .validate()?;

        let mut item = new_item.into_item(self.images, Utc::now());
        item.rating = self.rating;
        item.rating_count = self.rating_count;
        item.review_count = self.review_count;
        Ok(item)
    }
}

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub skipped: usize,
    pub invalid: usize,
}

/// Create every valid item that does not exist yet.
///
/// # Errors
///
/// Returns the first backend error; items created before it stay created.
pub async fn seed_items(
    store: &dyn DocumentStore,
    items: Vec<SeedItem>,
) -> Result<SeedSummary, StoreError> {
    let repo = ItemRepository::new(store);
    let mut summary = SeedSummary::default();

    for seed in items {
        let id = seed.item_id.clone();
        let item = match seed.into_item() {
            Ok(item) => item,
            Err(e) => {
                warn!(item_id = %id, error = %e, "Skipping invalid item");
                summary.invalid += 1;
                continue;
            }
        };

        match repo.create(&item).await {
            Ok(()) => {
                info!(item_id = %id, "Created item");
                summary.created += 1;
            }
            Err(StoreError::AlreadyExists(_)) => {
                info!(item_id = %id, "Item already exists, skipping");
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

/// Seed items from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a store
/// operation fails.
pub async fn run(
    store: &dyn DocumentStore,
    file_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading items from file");
    let content = tokio::fs::read_to_string(path).await?;
    let items: Vec<SeedItem> = serde_yaml::from_str(&content)?;
    info!(items = items.len(), "Parsed seed file");

    let summary = seed_items(store, items).await?;

    info!("Seeding complete!");
    info!("  Items created: {}", summary.created);
    info!("  Items skipped (already exist): {}", summary.skipped);
    if summary.invalid > 0 {
        error!("  Invalid items: {}", summary.invalid);
    }

    Ok(())
}
