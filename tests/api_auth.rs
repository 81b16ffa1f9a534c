//! Auth surface: register, login, profile, password change and the reset flow.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use alumnet::{
    app::build_app,
    auth::repo::UserStore,
    config::{AppConfig, JwtConfig},
    mailer::Mailer,
    state::AppState,
    store::MemoryStore,
};

use common::{get, post, put, register, test_app};

#[tokio::test]
async fn register_returns_token_and_public_user() {
    let app = test_app();
    let (status, body) = post(
        &app,
        "/api/auth/register",
        None,
        &json!({ "username": "alice", "email": "alice@x.com", "password": "secret1" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@x.com");
    // The secret never appears in any form.
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn register_duplicate_email_conflicts_despite_new_username() {
    let app = test_app();
    register(&app, "alice", "alice@x.com", "secret1").await;

    let (status, body) = post(
        &app,
        "/api/auth/register",
        None,
        &json!({ "username": "not-alice", "email": "alice@x.com", "password": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = test_app();
    register(&app, "alice", "alice@x.com", "secret1").await;

    let (status, _) = post(
        &app,
        "/api/auth/register",
        None,
        &json!({ "username": "alice", "email": "other@x.com", "password": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let app = test_app();
    let (status, body) = post(
        &app,
        "/api/auth/register",
        None,
        &json!({ "username": "ab", "email": "nope", "password": "123" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    let fields: Vec<&str> = errors.iter().filter_map(|e| e["field"].as_str()).collect();
    assert_eq!(fields, vec!["username", "email", "password"]);
}

#[tokio::test]
async fn login_succeeds_with_normalized_email() {
    let app = test_app();
    register(&app, "alice", "alice@x.com", "secret1").await;

    let (status, body) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "  Alice@X.com ", "password": "secret1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = test_app();
    register(&app, "alice", "alice@x.com", "secret1").await;

    let wrong_password = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "alice@x.com", "password": "wrong-secret" }),
    )
    .await;
    let unknown_email = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "nobody@x.com", "password": "secret1" }),
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::BAD_REQUEST);
    // Same status, same body, byte for byte.
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.1["message"], "Invalid credentials");
}

#[tokio::test]
async fn protected_route_rejects_missing_and_garbage_tokens() {
    let app = test_app();

    let (status, body) = put(&app, "/api/auth/profile", None, &json!({ "bio": "hi" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token, authorization denied");

    let (status, body) = put(
        &app,
        "/api/auth/profile",
        Some("not-a-real-token"),
        &json!({ "bio": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is not valid");
}

#[tokio::test]
async fn valid_token_for_vanished_user_is_rejected() {
    let state = AppState::fake();
    let app = build_app(state.clone());

    // Properly signed, but its subject was never registered.
    let token = state.tokens.issue(uuid::Uuid::new_v4()).expect("issue");
    let (status, body) = put(
        &app,
        "/api/auth/profile",
        Some(&token),
        &json!({ "bio": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is not valid");
}

#[tokio::test]
async fn profile_update_changes_only_supplied_fields() {
    let app = test_app();
    let (token, _) = register(&app, "alice", "alice@x.com", "secret1").await;

    let (status, body) = put(
        &app,
        "/api/auth/profile",
        Some(&token),
        &json!({ "bio": "class of 2019" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "class of 2019");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@x.com");
}

#[tokio::test]
async fn profile_update_rejects_identifiers_held_by_others() {
    let app = test_app();
    let (token, _) = register(&app, "alice", "alice@x.com", "secret1").await;
    register(&app, "bob", "bob@x.com", "secret2").await;

    let (status, body) = put(
        &app,
        "/api/auth/profile",
        Some(&token),
        &json!({ "username": "bob" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username or email already taken");

    // Re-submitting your own identifiers is not a collision.
    let (status, _) = put(
        &app,
        "/api/auth/profile",
        Some(&token),
        &json!({ "username": "alice", "email": "alice@x.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_change_requires_the_current_secret() {
    let app = test_app();
    let (token, _) = register(&app, "alice", "alice@x.com", "secret1").await;

    let (status, body) = put(
        &app,
        "/api/auth/password",
        Some(&token),
        &json!({ "currentPassword": "wrong", "newPassword": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, _) = put(
        &app,
        "/api/auth/password",
        Some(&token),
        &json!({ "currentPassword": "secret1", "newPassword": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The old secret stops working, the new one logs in.
    let (status, _) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "alice@x.com", "password": "secret1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "alice@x.com", "password": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Mailer double that hands the reset token back to the test.
struct CapturingMailer(Mutex<Option<String>>);

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_password_reset(&self, _email: &str, token: &str) -> anyhow::Result<()> {
        *self.0.lock().expect("mailer lock") = Some(token.to_string());
        Ok(())
    }
}

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        database_url: "postgres://unused".into(),
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_hours: 24,
        },
        reset_token_ttl_minutes: 60,
    })
}

#[tokio::test]
async fn reset_flow_is_single_use() {
    let mailer = Arc::new(CapturingMailer(Mutex::new(None)));
    let store = MemoryStore::new();
    let state = AppState::from_parts(test_config(), store.clone(), store, mailer.clone());
    let app = build_app(state);

    register(&app, "alice", "alice@x.com", "secret1").await;

    // Unknown and known addresses get the same neutral answer.
    let known = post(
        &app,
        "/api/auth/forgot-password",
        None,
        &json!({ "email": "alice@x.com" }),
    )
    .await;
    let unknown = post(
        &app,
        "/api/auth/forgot-password",
        None,
        &json!({ "email": "nobody@x.com" }),
    )
    .await;
    assert_eq!(known.0, StatusCode::OK);
    assert_eq!(known, unknown);

    let token = mailer
        .0
        .lock()
        .expect("mailer lock")
        .clone()
        .expect("token captured");
    assert_eq!(token.len(), 64);

    let (status, _) = post(
        &app,
        &format!("/api/auth/reset-password/{token}"),
        None,
        &json!({ "password": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "alice@x.com", "password": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Spent tokens never work twice.
    let (status, body) = post(
        &app,
        &format!("/api/auth/reset-password/{token}"),
        None,
        &json!({ "password": "secret3" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired reset token");
}

#[tokio::test]
async fn expired_reset_token_is_refused() {
    let store = MemoryStore::new();
    let state = AppState::from_parts(
        test_config(),
        store.clone(),
        store.clone(),
        Arc::new(CapturingMailer(Mutex::new(None))),
    );
    let app = build_app(state);

    let (_, user) = register(&app, "alice", "alice@x.com", "secret1").await;
    let user_id = user["id"].as_str().expect("user id").parse().expect("uuid");
    store
        .set_reset_token(
            user_id,
            "stale-token",
            OffsetDateTime::now_utc() - Duration::minutes(1),
        )
        .await
        .expect("set token");

    let (status, body) = post(
        &app,
        "/api/auth/reset-password/stale-token",
        None,
        &json!({ "password": "secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired reset token");
}

#[tokio::test]
async fn health_endpoint_answers() {
    let app = test_app();
    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
