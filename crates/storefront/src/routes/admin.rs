//! Admin item form.
//!
//! The form is `multipart/form-data`: text fields for the item plus any
//! number of `images` file parts. Images are uploaded in the order they were
//! submitted; the first one becomes the listing thumbnail.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use tracing::instrument;

use kirana_core::{ItemId, NewItem, split_list};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::CurrentUser;
use crate::services::{CatalogError, ImageUpload};
use crate::state::AppState;

/// Raw form values, kept as entered so the form can be re-rendered.
#[derive(Debug, Clone, Default)]
pub struct ItemForm {
    pub item_id: String,
    pub title: String,
    pub price: String,
    pub original_price: String,
    pub tagline: String,
    pub product_details: String,
    pub delivery: String,
    pub color: String,
    pub size: String,
    pub tags: String,
}

impl ItemForm {
    fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "itemId" => &mut self.item_id,
            "title" => &mut self.title,
            "price" => &mut self.price,
            "originalPrice" => &mut self.original_price,
            "tagline" => &mut self.tagline,
            "productDetails" => &mut self.product_details,
            "delivery" => &mut self.delivery,
            "color" => &mut self.color,
            "size" => &mut self.size,
            "tags" => &mut self.tags,
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
                return;
            }
        };
        *slot = value;
    }

    /// Parse the text fields into a [`NewItem`].
    ///
    /// # Errors
    ///
    /// Returns a message for the first field that cannot be parsed.
    pub fn to_new_item(&self) -> std::result::Result<NewItem, String> {
        let id = ItemId::parse(self.item_id.trim())
            .map_err(|e| format!("Item ID is invalid: {e}"))?;
        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| "Price must be a number".to_string())?;
        let original_price = match self.original_price.trim() {
            "" => None,
            raw => Some(
                Decimal::from_str(raw)
                    .map_err(|_| "Original price must be a number".to_string())?,
            ),
        };

        Ok(NewItem {
            id,
            title: self.title.clone(),
            price,
            original_price,
            tagline: self.tagline.clone(),
            product_details: self.product_details.clone(),
            delivery: self.delivery.clone(),
            color: split_list(&self.color),
            size: split_list(&self.size),
            tags: split_list(&self.tags),
        })
    }
}

/// New item page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/new_item.html")]
pub struct NewItemTemplate {
    pub user: Option<CurrentUser>,
    pub form: ItemForm,
    pub error: Option<String>,
}

/// Display the new item form.
pub async fn new_item_page(RequireAdmin(user): RequireAdmin) -> impl IntoResponse {
    NewItemTemplate {
        user: Some(user),
        form: ItemForm::default(),
        error: None,
    }
}

/// Read every part of the form. File parts without a file name or content
/// (the browser sends one empty part when nothing was chosen) are dropped.
async fn read_form(mut multipart: Multipart) -> Result<(ItemForm, Vec<ImageUpload>)> {
    let mut form = ItemForm::default();
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "images" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid image upload: {e}")))?;
            if !file_name.is_empty() && !bytes.is_empty() {
                images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid form data: {e}")))?;
            form.set(&name, value);
        }
    }

    Ok((form, images))
}

/// Create an item from the submitted form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_item(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    multipart: Multipart,
) -> Result<Response> {
    let (form, images) = read_form(multipart).await?;

    let rerender = |user: CurrentUser, form: ItemForm, status: StatusCode, error: String| {
        (
            status,
            NewItemTemplate {
                user: Some(user),
                form,
                error: Some(error),
            },
        )
            .into_response()
    };

    let new_item = match form.to_new_item() {
        Ok(item) => item,
        Err(message) => {
            return Ok(rerender(user, form, StatusCode::BAD_REQUEST, message));
        }
    };

    match state.catalog().create(new_item, images).await {
        Ok(item) => {
            tracing::info!(item_id = %item.id, "Admin created item");
            Ok(Redirect::to(&format!("/items/{}", urlencoding::encode(item.id.as_str())))
                .into_response())
        }
        Err(
            e @ (CatalogError::Invalid(_)
            | CatalogError::AlreadyExists(_)
            | CatalogError::DuplicateImage(_)),
        ) => {
            let err = AppError::from(e);
            Ok(rerender(user, form, err.status(), err.public_message()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ItemForm {
        let mut form = ItemForm::default();
        form.set("itemId", "kurta-01".to_string());
        form.set("title", "Cotton Kurta".to_string());
        form.set("price", "799".to_string());
        form.set("tags", "ethnic, summer, ethnic".to_string());
        form
    }

    #[test]
    fn test_to_new_item() {
        let item = form().to_new_item().unwrap();
        assert_eq!(item.id.as_str(), "kurta-01");
        assert_eq!(item.price, Decimal::new(799, 0));
        assert_eq!(item.original_price, None);
        assert_eq!(item.tags, vec!["ethnic", "summer"]);
    }

    #[test]
    fn test_to_new_item_errors() {
        let mut bad_price = form();
        bad_price.set("price", "cheap".to_string());
        assert_eq!(bad_price.to_new_item().unwrap_err(), "Price must be a number");

        let mut bad_id = form();
        bad_id.set("itemId", " ".to_string());
        assert!(bad_id.to_new_item().unwrap_err().starts_with("Item ID is invalid"));
    }
}
