// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and session routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::db::password::compare_password;
use crate::db::StoreError;
use crate::error::{AppError, Result};
use crate::logging::audit;
use crate::middleware::auth::{extract_token, AuthUser, SESSION_COOKIE};
use crate::models::PublicUser;
use crate::routes::extract::ValidatedJson;
use crate::AppState;

/// Public account routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Routes that need a session. Auth is applied in routes/mod.rs.
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(me))
}

// ─── Request / Response Types ────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "validate_username"))]
    pub username: String,
}

/// Usernames are stored trimmed, so the length rule applies after trimming.
fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    let len = username.trim().chars().count();
    if (3..=30).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::new("length")
            .with_message("Username must be between 3 and 30 characters".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    /// Same value as the session cookie, for clients that send a Bearer header
    pub token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user: PublicUser,
}

// ─── Session Cookie ──────────────────────────────────────────

fn session_cookie(state: &AppState, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(state.config.is_production())
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Issue a token for `user_id` and return it with the cookie that carries it.
fn start_session(state: &AppState, jar: CookieJar, user_id: &str) -> Result<(CookieJar, String)> {
    let token = state
        .sessions
        .issue(user_id)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let ttl = i64::try_from(state.sessions.ttl_secs()).unwrap_or(i64::MAX);
    let jar = jar.add(session_cookie(state, token.clone(), ttl));
    Ok((jar, token))
}

// ─── Handlers ────────────────────────────────────────────────

/// Register a new user and start a session.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let user = state
        .store
        .create_user(&req.email, &req.password, &req.username)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail | StoreError::DuplicateUsername => AppError::from(e),
            other => AppError::operation("Failed to register user", other),
        })?;

    audit::registration(&user.id, &user.email);
    let (jar, token) = start_session(&state, jar, &user.id)?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let user = state
        .store
        .find_by_email(&req.email)
        .await
        .map_err(|e| AppError::operation("Failed to login", e))?;

    // Same response for unknown email and wrong password.
    let Some(user) = user else {
        audit::login(&req.email, None);
        return Err(AppError::InvalidCredentials);
    };
    if !compare_password(&user, &req.password).await {
        audit::login(&req.email, None);
        return Err(AppError::InvalidCredentials);
    }

    audit::login(&user.email, Some(&user.id));
    let (jar, token) = start_session(&state, jar, &user.id)?;

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Clear the session cookie. Tokens are stateless, so nothing is revoked.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, Json<MessageResponse>) {
    let user_id = extract_token(&jar, &headers).and_then(|t| state.sessions.verify(&t).ok());
    audit::logout(user_id.as_deref());

    let jar = jar.add(session_cookie(&state, String::new(), 0));
    (
        jar,
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// Get the current user.
async fn me(Extension(auth): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user: auth.user.into(),
    })
}
