//! HTTP endpoint tests against the router with in-memory stores.

mod support;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_service_lib::api::{create_router, AppState};
use support::TestApp;

fn router(app: &TestApp) -> Router {
    create_router(AppState::detached(app.auth.clone()))
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_dexter(app: &TestApp) -> Value {
    let (status, body) = post_json(
        router(app),
        "/api/v1/auth/register",
        json!({"email": "dexter@x.com", "name": "Dexter Morgan", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health_without_database() {
    let app = TestApp::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = router(&app).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_returns_token_pair() {
    let app = TestApp::new();
    let body = register_dexter(&app).await;

    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], "dexter@x.com");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_validation_error() {
    let app = TestApp::new();
    let (status, body) = post_json(
        router(&app),
        "/api/v1/auth/register",
        json!({"email": "dexter", "name": "Dexter Morgan", "password": "password123"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_duplicate_is_conflict() {
    let app = TestApp::new();
    register_dexter(&app).await;

    let (status, body) = post_json(
        router(&app),
        "/api/v1/auth/register",
        json!({"email": "dexter@x.com", "name": "Dexter Morgan", "password": "password123"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_login_failure_body_is_generic() {
    let app = TestApp::new();
    register_dexter(&app).await;

    let (wrong_status, wrong_body) = post_json(
        router(&app),
        "/api/v1/auth/login",
        json!({"email": "dexter@x.com", "password": "hunter2"}),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        router(&app),
        "/api/v1/auth/login",
        json!({"email": "lundy@x.com", "password": "password123"}),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(
        wrong_body["error"]["message"],
        common::error::AUTHENTICATION_FAILED_MESSAGE
    );
}

#[tokio::test]
async fn test_refresh_replay_is_unauthorized() {
    let app = TestApp::new();
    let registered = register_dexter(&app).await;
    let r1 = registered["refresh_token"].clone();

    let (status, rotated) =
        post_json(router(&app), "/api/v1/auth/refresh", json!({"refresh_token": r1})).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"], r1);

    let (status, body) =
        post_json(router(&app), "/api/v1/auth/refresh", json!({"refresh_token": r1})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_logout_then_refresh() {
    let app = TestApp::new();
    let registered = register_dexter(&app).await;
    let token = registered["refresh_token"].clone();

    let (status, _) =
        post_json(router(&app), "/api/v1/auth/logout", json!({"refresh_token": token})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        post_json(router(&app), "/api/v1/auth/refresh", json!({"refresh_token": token})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_bearer_token() {
    let app = TestApp::new();
    let registered = register_dexter(&app).await;
    let access = registered["access_token"].as_str().unwrap();

    let request = Request::builder()
        .uri("/api/v1/auth/verify")
        .header(header::AUTHORIZATION, format!("Bearer {}", access))
        .body(Body::empty())
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["subject"], "dexter@x.com");

    let missing = Request::builder()
        .uri("/api/v1/auth/verify")
        .body(Body::empty())
        .unwrap();
    let response = router(&app).oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
