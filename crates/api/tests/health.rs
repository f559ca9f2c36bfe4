//! Health endpoint, authentication and middleware behaviour.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{alice, body_json, build_test_app};

#[tokio::test]
async fn test_health_is_public() {
    let app = build_test_app();
    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["db_healthy"].is_null());
}

#[tokio::test]
async fn test_request_id_is_set_on_response() {
    let app = build_test_app();
    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = build_test_app();
    let response = app
        .send(
            Request::get("/health")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = build_test_app();
    let response = app
        .send(Request::get("/api/v1/projects").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_401() {
    let app = build_test_app();
    let response = app
        .send(
            Request::get("/api/v1/projects")
                .header("authorization", "Basic YWxpY2U6c2VjcmV0")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejected_token_is_401() {
    let app = build_test_app();
    let response = app.get("/api/v1/projects", "not-a-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let app = build_test_app();
    let response = app.get("/api/v1/projects", &alice()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}
