//! `POST /api/cart` contract.

#![allow(clippy::unwrap_used)]

use futures::future::join_all;
use kirana_integration_tests::TestApp;
use reqwest::StatusCode;
use serde_json::json;

async fn app_with_catalog() -> TestApp {
    let app = TestApp::spawn().await;
    app.seed_item("sku1", "Cotton Kurta", 799, &["ethnic"]).await;
    app.seed_item("sku2", "Silk Saree", 2499, &["wedding"]).await;
    app.seed_user("u1", "asha@kirana.shop").await;
    app
}

#[tokio::test]
async fn test_add_twice_increments_quantity() {
    let app = app_with_catalog().await;
    let client = app.client();
    let body = json!({"userId": "u1", "itemId": "sku1", "action": "add"});

    let (status, first) = app.post_cart(&client, body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], "Item added to cart");
    assert_eq!(first["cart"], json!([{"itemId": "sku1", "quantity": 1}]));

    let (status, second) = app.post_cart(&client, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cart"], json!([{"itemId": "sku1", "quantity": 2}]));
    assert_eq!(
        app.stored_cart("u1").await,
        json!([{"itemId": "sku1", "quantity": 2}])
    );
}

#[tokio::test]
async fn test_update_then_remove() {
    let app = app_with_catalog().await;
    let client = app.client();

    for item in ["sku1", "sku2"] {
        let (status, _) = app
            .post_cart(&client, json!({"userId": "u1", "itemId": item, "action": "add"}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .post_cart(
            &client,
            json!({"userId": "u1", "itemId": "sku2", "action": "update", "quantity": 4}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart updated");
    assert_eq!(
        body["cart"],
        json!([{"itemId": "sku1", "quantity": 1}, {"itemId": "sku2", "quantity": 4}])
    );

    let (status, body) = app
        .post_cart(&client, json!({"userId": "u1", "itemId": "sku1", "action": "remove"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item removed from cart");
    assert_eq!(body["cart"], json!([{"itemId": "sku2", "quantity": 4}]));
}

#[tokio::test]
async fn test_validation_errors() {
    let app = app_with_catalog().await;
    let client = app.client();

    let cases = [
        (
            json!({"itemId": "sku1", "action": "add"}),
            "userId, itemId and action are required",
        ),
        (
            json!({"userId": "u1", "itemId": "sku1", "action": "wishlist"}),
            "Invalid action",
        ),
        (
            json!({"userId": "u1", "itemId": "sku1", "action": "update"}),
            "quantity is required for update",
        ),
        (
            json!({"userId": "u1", "itemId": "sku1", "action": "update", "quantity": 0}),
            "quantity must be between 1 and 999",
        ),
        (
            json!({"userId": "u1", "itemId": "sku1", "action": "update", "quantity": 1000}),
            "quantity must be between 1 and 999",
        ),
    ];

    for (body, message) in cases {
        let (status, response) = app.post_cart(&client, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{message}");
        assert_eq!(response["message"], message);
    }
    assert_eq!(app.stored_cart("u1").await, json!([]));
}

#[tokio::test]
async fn test_malformed_body() {
    let app = app_with_catalog().await;

    let resp = app
        .client()
        .post(app.url("/api/cart"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid request body");
}

#[tokio::test]
async fn test_not_found_errors() {
    let app = app_with_catalog().await;
    let client = app.client();

    let (status, body) = app
        .post_cart(&client, json!({"userId": "u1", "itemId": "nope", "action": "add"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Item not found");

    let (status, body) = app
        .post_cart(&client, json!({"userId": "ghost", "itemId": "sku1", "action": "add"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = app
        .post_cart(&client, json!({"userId": "u1", "itemId": "sku2", "action": "remove"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Item not found in cart");
}

#[tokio::test]
async fn test_update_absent_line_keeps_cart() {
    let app = app_with_catalog().await;
    let client = app.client();

    let (status, body) = app
        .post_cart(
            &client,
            json!({"userId": "u1", "itemId": "sku1", "action": "update", "quantity": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"], json!([]));
}

#[tokio::test]
async fn test_wrong_method() {
    let app = app_with_catalog().await;

    let resp = app.client().get(app.url("/api/cart")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn test_session_user_cannot_touch_other_carts() {
    let app = app_with_catalog().await;
    let client = app.client();
    app.sign_up(&client, "Ravi", "ravi@kirana.shop").await;
    let ravi = app.user_id_for("ravi@kirana.shop").await;

    let (status, body) = app
        .post_cart(&client, json!({"userId": "u1", "itemId": "sku1", "action": "add"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Cannot modify another user's cart");
    assert_eq!(app.stored_cart("u1").await, json!([]));

    let (status, body) = app
        .post_cart(&client, json!({"userId": ravi, "itemId": "sku1", "action": "add"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"], json!([{"itemId": "sku1", "quantity": 1}]));
}

#[tokio::test]
async fn test_concurrent_adds_are_not_lost() {
    let app = app_with_catalog().await;
    let client = app.client();
    let body = json!({"userId": "u1", "itemId": "sku1", "action": "add"});

    let requests = (0..4).map(|_| app.post_cart(&client, body.clone()));
    for (status, _) in join_all(requests).await {
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(
        app.stored_cart("u1").await,
        json!([{"itemId": "sku1", "quantity": 4}])
    );
}
