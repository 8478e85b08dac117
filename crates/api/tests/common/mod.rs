#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use pymeauth_api::auth::jwt::{generate_access_token, JwtConfig};
use pymeauth_api::auth::password::{hash_password, PasswordConfig};
use pymeauth_api::auth::service::AuthService;
use pymeauth_api::config::{AuthConfig, ServerConfig};
use pymeauth_api::router::build_app_router;
use pymeauth_api::state::AppState;
use pymeauth_core::roles::Role;
use pymeauth_db::models::user::User;
use pymeauth_db::{MemoryStore, Store};

pub const ADMIN_EMAIL: &str = "admin@pymeauth.test";
pub const ADMIN_PASSWORD: &str = "admin-password-1";

/// Argon2 at its minimum cost so tests stay fast.
pub fn cheap_password_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        password: cheap_password_config(),
        ..AuthConfig::default()
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "memory://".to_string(),
        database_max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        auth: test_auth_config(),
    }
}

pub fn build_service(store: &MemoryStore, config: AuthConfig) -> AuthService {
    AuthService::new(Arc::new(store.clone()), config).expect("service construction should succeed")
}

/// Build the full application router over an in-memory store.
///
/// Uses the same builder as `main.rs`, so tests exercise the production
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery).
pub fn build_test_app(store: MemoryStore) -> Router {
    build_test_app_with(store, test_config())
}

pub fn build_test_app_with(store: MemoryStore, config: ServerConfig) -> Router {
    let auth = build_service(&store, config.auth.clone());
    let state = AppState {
        store: Arc::new(store),
        auth: Arc::new(auth),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Insert an ADMIN user (and its business) directly through the store.
pub async fn seed_admin(store: &MemoryStore) -> User {
    let hash = hash_password(ADMIN_PASSWORD, &cheap_password_config()).unwrap();
    let mut uow = store.begin().await.unwrap();
    let business = uow.create_business("Platform", "+1 555 0000").await.unwrap();
    let user = uow
        .create_user(ADMIN_EMAIL, &hash, Role::Admin, business.id)
        .await
        .unwrap();
    uow.commit().await.unwrap();
    user
}

/// Mint an access token for `user` with the test JWT secret.
pub fn token_for(user_id: i64, role: Role, business_id: i64) -> String {
    generate_access_token(user_id, role.as_str(), business_id, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
