//! Listing, item, cart and search pages.

#![allow(clippy::unwrap_used)]

use kirana_integration_tests::{TestApp, location};
use reqwest::StatusCode;
use serde_json::json;

async fn app_with_catalog() -> TestApp {
    let app = TestApp::spawn().await;
    app.seed_item_json(json!({
        "id": "kurta-01",
        "title": "Cotton Kurta",
        "price": 600,
        "originalPrice": 1000,
        "tagline": "Breathable everyday cotton",
        "tags": ["ethnic", "summer"],
    }))
    .await;
    app.seed_item("saree-02", "Silk Saree", 2499, &["wedding"])
        .await;
    app
}

#[tokio::test]
async fn test_home_lists_items_with_welcome() {
    let app = app_with_catalog().await;

    let resp = app.client().get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Welcome to Kirana"));
    assert!(html.contains("/auth/login"));
    assert!(html.contains("Cotton Kurta"));
    assert!(html.contains("Silk Saree"));
    assert!(html.contains("40% off"));
}

#[tokio::test]
async fn test_home_greets_signed_in_user() {
    let app = app_with_catalog().await;
    let client = app.client();
    app.sign_up(&client, "Ravi Kumar", "ravi@kirana.shop").await;

    let html = client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Ravi Kumar"));
    assert!(!html.contains("Welcome to Kirana"));
}

#[tokio::test]
async fn test_item_page() {
    let app = app_with_catalog().await;

    let resp = app
        .client()
        .get(app.url("/items/kurta-01"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Cotton Kurta"));
    assert!(html.contains("Breathable everyday cotton"));
    assert!(html.contains("₹600.00"));
    assert!(html.contains("₹1000.00"));
    assert!(html.contains("40% off"));

    let resp = app
        .client()
        .get(app.url("/items/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_requires_login() {
    let app = app_with_catalog().await;
    let client = app.client();

    let resp = client.get(app.url("/cart")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");

    let resp = client
        .post(app.url("/items/kurta-01/add-to-cart"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");
}

#[tokio::test]
async fn test_cart_page_flow() {
    let app = app_with_catalog().await;
    let client = app.client();
    app.sign_up(&client, "Asha", "asha@kirana.shop").await;
    let uid = app.user_id_for("asha@kirana.shop").await;

    for _ in 0..2 {
        let resp = client
            .post(app.url("/items/kurta-01/add-to-cart"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/cart");
    }
    assert_eq!(
        app.stored_cart(&uid).await,
        json!([{"itemId": "kurta-01", "quantity": 2}])
    );

    let html = client
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Cotton Kurta"));
    // 2 x 600, saving 2 x 400.
    assert!(html.contains("₹1200.00"));
    assert!(html.contains("₹800.00"));
    assert!(html.contains("₹2000.00"));

    let resp = client
        .post(app.url("/cart/update"))
        .form(&[("item_id", "kurta-01"), ("quantity", "5")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/cart");
    assert_eq!(
        app.stored_cart(&uid).await,
        json!([{"itemId": "kurta-01", "quantity": 5}])
    );

    let resp = client
        .post(app.url("/cart/remove"))
        .form(&[("item_id", "kurta-01")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/cart");
    assert_eq!(app.stored_cart(&uid).await, json!([]));

    let html = client
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_cart_failures_show_flash_once() {
    let app = app_with_catalog().await;
    let client = app.client();
    app.sign_up(&client, "Asha", "asha@kirana.shop").await;

    let resp = client
        .post(app.url("/cart/update"))
        .form(&[("item_id", "kurta-01"), ("quantity", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/cart");

    let html = client
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Failed to update cart. Please try again."));

    let html = client
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!html.contains("Failed to update cart"));

    let resp = client
        .post(app.url("/items/missing/add-to-cart"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/items/missing");
}

#[tokio::test]
async fn test_blank_quantity_keeps_cart_and_shows_flash() {
    let app = app_with_catalog().await;
    let client = app.client();
    app.sign_up(&client, "Asha", "asha@kirana.shop").await;
    let uid = app.user_id_for("asha@kirana.shop").await;
    client
        .post(app.url("/items/kurta-01/add-to-cart"))
        .send()
        .await
        .unwrap();

    for quantity in ["", "two"] {
        let resp = client
            .post(app.url("/cart/update"))
            .form(&[("item_id", "kurta-01"), ("quantity", quantity)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/cart");

        let html = client
            .get(app.url("/cart"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains("Failed to update cart. Please try again."));
    }
    assert_eq!(
        app.stored_cart(&uid).await,
        json!([{"itemId": "kurta-01", "quantity": 1}])
    );
}

#[tokio::test]
async fn test_sized_item_needs_size_before_add_to_cart() {
    let app = app_with_catalog().await;
    app.seed_item_json(json!({
        "id": "shirt-03",
        "title": "Linen Shirt",
        "price": 899,
        "size": ["M", "L"],
    }))
    .await;
    let client = app.client();
    app.sign_up(&client, "Asha", "asha@kirana.shop").await;
    let uid = app.user_id_for("asha@kirana.shop").await;

    let html = client
        .get(app.url("/items/shirt-03"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"name="size" value="M" required"#));

    let resp = client
        .post(app.url("/items/shirt-03/add-to-cart"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/items/shirt-03");
    let html = client
        .get(app.url("/items/shirt-03"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Please select a size"));
    assert_eq!(app.stored_cart(&uid).await, json!([]));

    let resp = client
        .post(app.url("/items/shirt-03/add-to-cart"))
        .form(&[("size", "L")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/cart");
    assert_eq!(
        app.stored_cart(&uid).await,
        json!([{"itemId": "shirt-03", "quantity": 1}])
    );
}

#[tokio::test]
async fn test_search_page() {
    let app = app_with_catalog().await;

    let html = app
        .client()
        .get(app.url("/search"))
        .query(&[("q", "wedding")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Silk Saree"));
    assert!(!html.contains("Cotton Kurta"));
    assert!(html.contains("1 result for"));
}
