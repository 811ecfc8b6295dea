//! Catalog inspection.

use tracing::info;

use kirana_storefront::db::{DocumentStore, ItemRepository};

/// Log every item with its price and image count.
///
/// # Errors
///
/// Returns an error if the items collection cannot be listed.
pub async fn list(store: &dyn DocumentStore) -> Result<(), Box<dyn std::error::Error>> {
    let items = ItemRepository::new(store).list().await?;

    info!("Catalog items: {}", items.len());
    for item in &items {
        let original = item
            .original_price
            .map(|p| format!(" (was {p})"))
            .unwrap_or_default();
        info!(
            "  {} | {} | {}{} | {} image(s)",
            item.id,
            item.title,
            item.price,
            original,
            item.images.len()
        );
    }

    Ok(())
}
