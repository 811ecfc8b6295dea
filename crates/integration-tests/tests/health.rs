//! Liveness and readiness endpoints.

#![allow(clippy::unwrap_used)]

use kirana_integration_tests::TestApp;
use reqwest::StatusCode;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let resp = app
        .client()
        .get(app.url("/health"))
        .header("x-request-id", "req-abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "req-abc-123");

    let resp = app.client().get(app.url("/health")).send().await.unwrap();
    assert!(!resp.headers()["x-request-id"].is_empty());
}
