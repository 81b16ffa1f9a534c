//! Shared helpers for the router-level suites: an app over the in-memory
//! store, and oneshot request plumbing that speaks JSON.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use alumnet::{app::build_app, state::AppState};

pub fn test_app() -> Router {
    build_app(AppState::fake())
}

/// Fire one request at the router and decode the response. Non-JSON bodies
/// come back as a plain string value.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, token, None).await
}

/// Register an account and return its bearer token plus the public user body.
pub async fn register(app: &Router, username: &str, email: &str, password: &str) -> (String, Value) {
    let (status, body) = post(
        app,
        "/api/auth/register",
        None,
        &json!({ "username": username, "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let token = body["token"].as_str().expect("token in response").to_string();
    (token, body["user"].clone())
}

/// Create a blog post and return its id.
pub async fn create_post(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = post(
        app,
        "/api/posts",
        Some(token),
        &json!({ "title": title, "content": "some content", "type": "blog" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
    body["id"].as_str().expect("post id").to_string()
}
