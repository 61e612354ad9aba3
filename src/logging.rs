// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracing subscriber setup and audit events.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Only the first call in a process
/// installs anything; later calls return an error the caller may ignore.
pub fn init(
    level: &str,
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Structured JSON for log aggregation; one event per line.
    let json = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .flatten_event(true)
    });
    let pretty = (format == LogFormat::Pretty).then(|| tracing_subscriber::fmt::layer().pretty());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
}

/// Security-relevant events, emitted on the `audit` target with an `action` field.
pub mod audit {
    use crate::error::AuthFailure;

    pub fn registration(user_id: &str, email: &str) {
        tracing::info!(target: "audit", action = "REGISTER", user_id, email, "User registered");
    }

    pub fn login(email: &str, user_id: Option<&str>) {
        match user_id {
            Some(user_id) => {
                tracing::info!(target: "audit", action = "LOGIN", success = true, user_id, email, "Login succeeded")
            }
            None => {
                tracing::warn!(target: "audit", action = "LOGIN", success = false, email, "Login failed")
            }
        }
    }

    pub fn logout(user_id: Option<&str>) {
        tracing::info!(target: "audit", action = "LOGOUT", user_id, "User logged out");
    }

    pub fn city_added(user_id: &str, city_id: &str) {
        tracing::info!(target: "audit", action = "CITY_ADDED", user_id, city_id, "City tracked");
    }

    pub fn city_removed(user_id: &str, city_id: &str) {
        tracing::info!(target: "audit", action = "CITY_REMOVED", user_id, city_id, "City untracked");
    }

    pub fn auth_failure(reason: AuthFailure, path: &str) {
        tracing::warn!(target: "audit", action = "AUTH_FAILURE", reason = %reason, path, "Request rejected");
    }
}
