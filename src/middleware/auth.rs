// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session tokens and authentication middleware.

use crate::config::Config;
use crate::error::{AppError, AuthFailure};
use crate::logging::audit;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "auth_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Why a session token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

impl From<SessionError> for AuthFailure {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Expired => AuthFailure::Expired,
            SessionError::Invalid => AuthFailure::InvalidToken,
        }
    }
}

/// Signing keys and lifetime for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_signing_key, config.session_ttl_secs)
    }

    /// Token and cookie lifetime in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Create a signed token for a user session.
    pub fn issue(&self, user_id: &str) -> anyhow::Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs as usize,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<String, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid,
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(SessionError::Invalid);
        }
        Ok(data.claims.sub)
    }
}

/// Authenticated user attached by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// Caller identity attached by [`optional_auth`], if any.
#[derive(Debug, Clone, Default)]
pub struct MaybeUser(pub Option<User>);

/// Pull the session token from the cookie, falling back to a Bearer header.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Resolve the caller. The store is only consulted once the token verifies.
async fn authenticate(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> Result<User, AppError> {
    let token = extract_token(jar, headers)
        .ok_or(AppError::Unauthorized(AuthFailure::MissingToken))?;

    let user_id = state
        .sessions
        .verify(&token)
        .map_err(|e| AppError::Unauthorized(e.into()))?;

    state
        .store
        .find_by_id(&user_id)
        .await?
        .ok_or(AppError::Unauthorized(AuthFailure::UserNotFound))
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match authenticate(&state, &jar, request.headers()).await {
        Ok(user) => user,
        Err(AppError::Unauthorized(reason)) => {
            audit::auth_failure(reason, request.uri().path());
            return Err(AppError::Unauthorized(reason));
        }
        Err(e) => return Err(e),
    };

    request.extensions_mut().insert(AuthUser { user });
    Ok(next.run(request).await)
}

/// Middleware that identifies the caller when it can, but never rejects.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match authenticate(&state, &jar, request.headers()).await {
        Ok(user) => Some(user),
        Err(AppError::Unauthorized(_)) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Optional authentication skipped");
            None
        }
    };

    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}
