// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Common test utilities for integration tests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use weather_tracker::config::Config;
use weather_tracker::db::{FirestoreDb, MemoryStore, StoreResult, UserStore};
use weather_tracker::models::{NewTrackedCity, ProfileUpdate, TrackedCity, User};
use weather_tracker::routes::create_router;
use weather_tracker::AppState;

/// Test signing key, matching `Config::test_default()`.
#[allow(dead_code)]
pub const TEST_JWT_KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!!";

/// Check if the Firestore emulator is available.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test if emulator is not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !common::emulator_available() {
            eprintln!("Skipping test: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection to the emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project", "(default)")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// [`UserStore`] wrapper that counts every call, to prove when the store is
/// not consulted.
#[allow(dead_code)]
pub struct CountingStore {
    inner: Arc<dyn UserStore>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(inner: Arc<dyn UserStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for CountingStore {
    async fn create_user(&self, email: &str, password: &str, username: &str) -> StoreResult<User> {
        self.hit();
        self.inner.create_user(email, password, username).await
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.hit();
        self.inner.find_by_id(user_id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.hit();
        self.inner.find_by_email(email).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.hit();
        self.inner.find_by_username(username).await
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> StoreResult<User> {
        self.hit();
        self.inner.update_profile(user_id, update).await
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<bool> {
        self.hit();
        self.inner.delete_user(user_id).await
    }

    async fn add_tracked_city(
        &self,
        user_id: &str,
        city: NewTrackedCity,
    ) -> StoreResult<Vec<TrackedCity>> {
        self.hit();
        self.inner.add_tracked_city(user_id, city).await
    }

    async fn remove_tracked_city(
        &self,
        user_id: &str,
        city_id: &str,
    ) -> StoreResult<Vec<TrackedCity>> {
        self.hit();
        self.inner.remove_tracked_city(user_id, city_id).await
    }

    async fn get_tracked_cities(&self, user_id: &str) -> StoreResult<Vec<TrackedCity>> {
        self.hit();
        self.inner.get_tracked_cities(user_id).await
    }
}

/// Create a test app backed by an in-memory store.
///
/// Upstream clients point at the public providers; tests that exercise
/// weather or search should use [`create_test_app_with`] and a mock server.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), Arc::new(MemoryStore::new()))
}

/// Create a test app from an explicit config and store.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, store: Arc<dyn UserStore>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, store).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

/// Config whose NWS and geocoding clients talk to `upstream`.
#[allow(dead_code)]
pub fn config_with_upstream(upstream: &str) -> Config {
    Config {
        nws_base_url: upstream.to_string(),
        geocoding_base_url: upstream.to_string(),
        ..Config::test_default()
    }
}

/// Create a JWT with arbitrary `exp` for testing.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, exp: i64) -> String {
    let claims = serde_json::json!({
        "sub": user_id,
        "iat": chrono::Utc::now().timestamp(),
        "exp": exp,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_KEY),
    )
    .unwrap()
}

/// A JSON request, optionally carrying a session cookie.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("auth_token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A GET request, optionally carrying a session cookie.
#[allow(dead_code)]
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("auth_token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Send one request through a clone of the router.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user and return their session token and public record.
#[allow(dead_code)]
pub async fn register_user(
    app: &Router,
    email: &str,
    username: &str,
    password: &str,
) -> (String, serde_json::Value) {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "email": email, "username": username, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    (token, body["user"].clone())
}

/// Extract all Set-Cookie header values from a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Find a Set-Cookie header by cookie name.
#[allow(dead_code)]
pub fn find_cookie<'a>(cookies: &'a [String], name: &str) -> Option<&'a String> {
    cookies
        .iter()
        .find(|c| c.starts_with(&format!("{}=", name)))
}

/// Mount NWS points and forecast responses for one point on `server`.
///
/// `point` is the `{lat},{lon}` path segment as the client formats it.
/// Station lookups are left unmounted, so current conditions come back empty.
#[allow(dead_code)]
pub async fn mount_nws_forecast(server: &wiremock::MockServer, point: &str, period_name: &str) {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    let grid = format!("/gridpoints/{}", point.replace([',', '.', '-'], "_"));

    Mock::given(method("GET"))
        .and(path(format!("/points/{}", point)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "properties": {
                "forecast": format!("{}/forecast", grid),
                "observationStations": format!("{}/stations", grid)
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/forecast", grid)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "properties": {
                "periods": [{
                    "number": 1,
                    "name": period_name,
                    "startTime": "2026-01-15T18:00:00-07:00",
                    "endTime": "2026-01-16T06:00:00-07:00",
                    "isDaytime": false,
                    "temperature": 28,
                    "temperatureUnit": "F",
                    "windSpeed": "5 mph",
                    "windDirection": "SW",
                    "icon": "https://api.weather.gov/icons/land/night/few",
                    "shortForecast": "Mostly Clear",
                    "detailedForecast": "Mostly clear, with a low around 28."
                }]
            }
        })))
        .mount(server)
        .await;
}
