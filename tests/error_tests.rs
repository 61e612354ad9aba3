// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error response shapes, fallback routes, and store failures.

mod common;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use serde_json::json;
use std::sync::Arc;
use weather_tracker::config::Config;
use weather_tracker::db::{FirestoreDb, StoreResult, UserStore};
use weather_tracker::models::{NewTrackedCity, ProfileUpdate, TrackedCity, User};

use common::{
    body_json, create_test_app, create_test_app_with, create_test_jwt, get_request,
    json_request, send,
};

/// A store whose every call panics.
struct PanickingStore;

#[async_trait]
impl UserStore for PanickingStore {
    async fn create_user(&self, _: &str, _: &str, _: &str) -> StoreResult<User> {
        panic!("store exploded")
    }
    async fn find_by_id(&self, _: &str) -> StoreResult<Option<User>> {
        panic!("store exploded")
    }
    async fn find_by_email(&self, _: &str) -> StoreResult<Option<User>> {
        panic!("store exploded")
    }
    async fn find_by_username(&self, _: &str) -> StoreResult<Option<User>> {
        panic!("store exploded")
    }
    async fn update_profile(&self, _: &str, _: ProfileUpdate) -> StoreResult<User> {
        panic!("store exploded")
    }
    async fn delete_user(&self, _: &str) -> StoreResult<bool> {
        panic!("store exploded")
    }
    async fn add_tracked_city(&self, _: &str, _: NewTrackedCity) -> StoreResult<Vec<TrackedCity>> {
        panic!("store exploded")
    }
    async fn remove_tracked_city(&self, _: &str, _: &str) -> StoreResult<Vec<TrackedCity>> {
        panic!("store exploded")
    }
    async fn get_tracked_cities(&self, _: &str) -> StoreResult<Vec<TrackedCity>> {
        panic!("store exploded")
    }
}

/// An app whose Firestore client is offline, so every store call fails.
fn offline_app() -> axum::Router {
    let (app, _) = create_test_app_with(Config::test_default(), Arc::new(FirestoreDb::new_mock()));
    app
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (app, _) = create_test_app();

    let response = send(&app, get_request("/api/nope", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let (app, _) = create_test_app();

    for uri in ["/health", "/api/nope", "/api/user/cities"] {
        let response = send(&app, get_request(uri, None)).await;
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff", "{}", uri);
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY", "{}", uri);
        assert!(headers.contains_key("strict-transport-security"), "{}", uri);
    }
}

#[tokio::test]
async fn test_error_bodies_are_json() {
    let (app, _) = create_test_app();

    let response = send(
        &app,
        json_request("POST", "/api/auth/login", json!({ "email": 42 }), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation error");
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_register_store_failure() {
    let app = offline_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": "alice@example.com", "username": "alice", "password": "secret123" }),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to register user");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_login_store_failure() {
    let app = offline_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "alice@example.com", "password": "secret123" }),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Failed to login");
}

#[tokio::test]
async fn test_session_lookup_failure_hides_details() {
    let app = offline_app();
    let token = create_test_jwt("user-123", chrono::Utc::now().timestamp() + 3600);

    let response = send(&app, get_request("/api/user/cities", Some(&token))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal server error" })
    );
}

#[tokio::test]
async fn test_public_weather_route_survives_store_failure() {
    let app = offline_app();
    let token = create_test_jwt("user-123", chrono::Utc::now().timestamp() + 3600);

    // Optional auth swallows the store error; the handler still validates input.
    let response = send(&app, get_request("/api/weather", Some(&token))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_handler_panic_becomes_500() {
    let (app, _) = create_test_app_with(Config::test_default(), Arc::new(PanickingStore));

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "alice@example.com", "password": "secret123" }),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal server error" })
    );

    // The app keeps serving.
    let response = send(&app, get_request("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
