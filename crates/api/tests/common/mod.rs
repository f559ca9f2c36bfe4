//! Shared fixtures: the full router on in-process storage, a token verifier
//! that trusts `user:<uuid>` / `admin:<uuid>` bearer tokens, and request
//! helpers built on `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use timeasy_core::clock::ManualClock;
use timeasy_core::identity::Caller;
use timeasy_db::MemoryStore;
use timeasy_usecase::Services;
use tower::ServiceExt;
use uuid::Uuid;

use timeasy_api::auth::{AuthError, TokenVerifier};
use timeasy_api::config::{DatabaseConfig, KeycloakConfig, LogFormat, ServerConfig, Storage};
use timeasy_api::router::build_app_router;
use timeasy_api::state::AppState;

pub const ALICE: Uuid = Uuid::from_u128(0xA);
pub const BOB: Uuid = Uuid::from_u128(0xB);
pub const CAROL: Uuid = Uuid::from_u128(0xC);

pub fn alice() -> String {
    format!("user:{ALICE}")
}

pub fn bob() -> String {
    format!("user:{BOB}")
}

/// Carol holds the global `ADMIN` role.
pub fn carol() -> String {
    format!("admin:{CAROL}")
}

/// Accepts `user:<uuid>` and `admin:<uuid>`; anything else is rejected.
struct TestVerifier;

#[async_trait]
impl TokenVerifier for TestVerifier {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let (kind, id) = token
            .split_once(':')
            .ok_or_else(|| AuthError::InvalidSubject(token.to_string()))?;
        let user_id: Uuid = id
            .parse()
            .map_err(|_| AuthError::InvalidSubject(id.to_string()))?;
        match kind {
            "user" => Ok(Caller::user(user_id)),
            "admin" => Ok(Caller::admin(user_id)),
            _ => Err(AuthError::MissingKeyId),
        }
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            name: "timeasy".to_string(),
            user: "dbuser".to_string(),
            password: "dbpassword".to_string(),
        },
        keycloak: KeycloakConfig {
            host: "http://localhost:8180".to_string(),
            realm: "timeasy".to_string(),
        },
        storage: Storage::Memory,
        cors_origins: vec!["http://localhost:8080".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Pretty,
    }
}

pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
}

/// The production router over a fresh in-process store. The clock starts
/// at 2023-08-01T00:00:00Z and only moves when a test advances it.
pub fn build_test_app() -> TestApp {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap());
    let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
    let state = AppState {
        services: Services::new(store, Arc::new(clock.clone())),
        verifier: Arc::new(TestVerifier),
        config: Arc::new(test_config()),
        pool: None,
    };
    TestApp {
        router: build_app_router(state).unwrap(),
        clock,
    }
}

impl TestApp {
    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(chrono::Duration::seconds(secs));
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::get(uri)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::delete(uri)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send(json_request("POST", uri, token, body)).await
    }

    pub async fn put_json(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send(json_request("PUT", uri, token, body)).await
    }

    /// Create a project and return its id.
    pub async fn project(&self, name: &str, token: &str) -> String {
        let response = self
            .post_json("/api/v1/projects", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        id_of(body_json(response).await)
    }

    /// Create a team (the caller becomes its admin) and return its id.
    pub async fn team(&self, name: &str, token: &str) -> String {
        let response = self
            .post_json("/api/v1/teams", token, serde_json::json!({ "name1": name }))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        id_of(body_json(response).await)
    }
}

fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn id_of(json: Value) -> String {
    json["id"].as_str().unwrap().to_string()
}
