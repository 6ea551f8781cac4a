//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against the embedded
//! backend.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dual_cache::{api::create_router, AnyCache, AppState, EmbeddedCache};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let cache = AnyCache::Embedded(EmbeddedCache::temporary().unwrap());
    create_router(AppState::new(cache))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn put_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/cache")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(json!({"key": "test_key", "value": "test_value"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, json!({"action": "stored", "target": "test_key"}));
}

#[tokio::test]
async fn test_set_endpoint_with_ttl() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(json!({"key": "ttl_key", "value": 1, "ttl": 60})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_roundtrip() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(put_json(json!({"key": "user:42", "value": {"name": "Ann"}})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/cache/user:42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "user:42");
    assert_eq!(json["value"], json!({"name": "Ann"}));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app.oneshot(get("/cache/missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

// == EXISTS Endpoint Tests ==

#[tokio::test]
async fn test_exists_endpoint() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "here", "value": true})))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/cache/here/exists")).await.unwrap();
    assert_eq!(body_to_json(response.into_body()).await["exists"], true);

    let response = app.oneshot(get("/cache/gone/exists")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["exists"], false);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_forget_then_get_not_found() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "user:42", "value": {"name": "Ann"}})))
        .await
        .unwrap();

    let response = app.clone().oneshot(delete("/cache/user:42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/cache/user:42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forget_absent_key_succeeds() {
    let app = create_test_app();

    let response = app.oneshot(delete("/cache/never_set")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_by_pattern_endpoint() {
    let app = create_test_app();

    for key in ["a:1", "a:2", "b:1"] {
        app.clone()
            .oneshot(put_json(json!({"key": key, "value": key})))
            .await
            .unwrap();
    }

    let response = app.clone().oneshot(delete("/cache?pattern=a:")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["target"], "a:");

    for (key, status) in [
        ("a:1", StatusCode::NOT_FOUND),
        ("a:2", StatusCode::NOT_FOUND),
        ("b:1", StatusCode::OK),
    ] {
        let response = app
            .clone()
            .oneshot(get(&format!("/cache/{}", key)))
            .await
            .unwrap();
        assert_eq!(response.status(), status, "unexpected status for {}", key);
    }
}

#[tokio::test]
async fn test_empty_all_endpoint() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "x", "value": 1})))
        .await
        .unwrap();

    let response = app.clone().oneshot(delete("/cache")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/cache/x")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["backend"], "embedded");
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/cache")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum rejects malformed JSON bodies with a 4xx status
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(json!({"key": "", "value": "v"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "short", "value": "lived", "ttl": 1})))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/cache/short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Wait for TTL to expire
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = app.oneshot(get("/cache/short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
