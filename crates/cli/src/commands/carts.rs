//! Cart maintenance.
//!
//! Older user documents may hold several lines for the same item or lines
//! with a zero quantity. Decoding a [`Cart`] already applies the cart rules,
//! so normalizing is: decode, compare with what is stored, and write back
//! the canonical form where it differs.

use serde_json::Value;
use tracing::{info, warn};

use kirana_core::{Cart, UserId};
use kirana_storefront::db::{Collection, DocumentStore, StoreError, UserRepository};

/// Outcome of a normalization run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub checked: usize,
    pub rewritten: usize,
    pub failed: usize,
}

/// Rewrite every cart that is not in canonical form.
///
/// Writes are conditional on the revision that was read; a user whose cart
/// changed in the meantime is reported as failed and left alone.
///
/// # Errors
///
/// Returns an error if the users collection cannot be listed.
pub async fn normalize_carts(store: &dyn DocumentStore) -> Result<NormalizeSummary, StoreError> {
    let users = UserRepository::new(store);
    let mut summary = NormalizeSummary::default();

    for document in store.list(Collection::Users).await? {
        summary.checked += 1;

        let stored = document
            .fields
            .get("cart")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let (Ok(uid), Ok(cart)) = (
            UserId::parse(&document.id),
            serde_json::from_value::<Cart>(stored.clone()),
        ) else {
            warn!(user_id = %document.id, "Skipping user with an undecodable cart");
            summary.failed += 1;
            continue;
        };

        let canonical =
            serde_json::to_value(&cart).map_err(|e| StoreError::Encode(e.to_string()))?;
        if canonical == stored {
            continue;
        }

        match users
            .update_cart(&uid, &cart, Some(&document.revision))
            .await
        {
            Ok(_) => {
                info!(user_id = %uid, lines = cart.len(), "Normalized cart");
                summary.rewritten += 1;
            }
            Err(e) => {
                warn!(user_id = %uid, error = %e, "Failed to rewrite cart");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Normalize every stored cart.
///
/// # Errors
///
/// Returns an error if the users collection cannot be listed.
pub async fn normalize(store: &dyn DocumentStore) -> Result<(), Box<dyn std::error::Error>> {
    let summary = normalize_carts(store).await?;

    info!("Normalization complete!");
    info!("  Users checked: {}", summary.checked);
    info!("  Carts rewritten: {}", summary.rewritten);
    if summary.failed > 0 {
        warn!("  Users failed: {}", summary.failed);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kirana_storefront::db::MemoryStore;
    use serde_json::json;

    use super::*;

    async fn insert_user(store: &MemoryStore, uid: &str, cart: Value) {
        let fields = json!({
            "name": "Asha",
            "email": "asha@kirana.shop",
            "cart": cart,
        });
        store
            .create(Collection::Users, uid, fields.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_normalize_merges_legacy_lines() {
        let store = MemoryStore::new();
        insert_user(
            &store,
            "legacy",
            json!([
                {"itemId": "sku1", "quantity": 1},
                {"itemId": "sku2", "quantity": 0},
                {"itemId": "sku1", "quantity": 2},
            ]),
        )
        .await;
        insert_user(&store, "clean", json!([{"itemId": "sku1", "quantity": 3}])).await;

        let summary = normalize_carts(&store).await.unwrap();
        assert_eq!(
            summary,
            NormalizeSummary {
                checked: 2,
                rewritten: 1,
                failed: 0
            }
        );

        let doc = store.get(Collection::Users, "legacy").await.unwrap().unwrap();
        assert_eq!(doc.fields["cart"], json!([{"itemId": "sku1", "quantity": 3}]));
        assert_eq!(doc.fields["name"], "Asha");

        let again = normalize_carts(&store).await.unwrap();
        assert_eq!(again.rewritten, 0);
    }

    #[tokio::test]
    async fn test_normalize_reports_undecodable_cart() {
        let store = MemoryStore::new();
        insert_user(&store, "broken", json!("not a cart")).await;

        let summary = normalize_carts(&store).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.rewritten, 0);
    }
}
