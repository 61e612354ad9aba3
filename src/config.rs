//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file in the working directory
//! is honoured for local development.

use std::env;

/// Default NWS API base URL.
pub const DEFAULT_NWS_BASE_URL: &str = "https://api.weather.gov";
/// Default Nominatim base URL.
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://nominatim.openstreetmap.org";
/// Default session lifetime (7 days).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
/// Minimum accepted length of the session signing secret.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Deployment environment. Controls the `Secure` flag on the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

/// Which credential store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Log output format, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    pub app_env: AppEnv,

    // --- Persistence ---
    pub store_backend: StoreBackend,
    /// GCP project hosting the Firestore database
    pub gcp_project_id: String,
    /// Firestore database name
    pub firestore_database: String,

    // --- Sessions ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Session token and cookie lifetime
    pub session_ttl_secs: u64,

    // --- Logging ---
    pub log_level: String,
    pub log_format: LogFormat,

    /// Allowed CORS origins. Empty means localhost only.
    pub cors_origins: Vec<String>,

    // --- Upstream providers ---
    pub nws_base_url: String,
    /// Contact string NWS asks clients to put in the User-Agent
    pub nws_user_agent: String,
    pub geocoding_base_url: String,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            port: 3000,
            app_env: AppEnv::Test,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            firestore_database: "(default)".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            log_level: "debug".to_string(),
            log_format: LogFormat::Pretty,
            cors_origins: Vec::new(),
            nws_base_url: DEFAULT_NWS_BASE_URL.to_string(),
            nws_user_agent: "test@example.com".to_string(),
            geocoding_base_url: DEFAULT_GEOCODING_BASE_URL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match var_or("STORE_BACKEND", "firestore").as_str() {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    reason: format!("unknown backend '{}'", other),
                })
            }
        };

        let gcp_project_id = match store_backend {
            StoreBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StoreBackend::Memory => var_or("GCP_PROJECT_ID", "local-dev"),
        };

        let jwt_signing_key = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
            .trim()
            .as_bytes()
            .to_vec();
        if jwt_signing_key.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
            });
        }

        let port = var_or("PORT", "3000")
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| ConfigError::Invalid {
                var: "PORT",
                reason: "must be between 1 and 65535".to_string(),
            })?;

        let app_env = match var_or("APP_ENV", "development").as_str() {
            "production" => AppEnv::Production,
            "test" => AppEnv::Test,
            _ => AppEnv::Development,
        };

        let log_format = match var_or("LOG_FORMAT", "json").as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    reason: format!("unknown format '{}'", other),
                })
            }
        };

        let session_ttl_secs =
            parse_duration_secs(&var_or("JWT_EXPIRES_IN", "7d")).ok_or_else(|| {
                ConfigError::Invalid {
                    var: "JWT_EXPIRES_IN",
                    reason: "expected seconds or a value like 7d, 12h, 30m".to_string(),
                }
            })?;

        Ok(Self {
            port,
            app_env,
            store_backend,
            gcp_project_id,
            firestore_database: var_or("FIRESTORE_DATABASE", "(default)"),
            jwt_signing_key,
            session_ttl_secs,
            log_level: var_or("LOG_LEVEL", "info"),
            log_format,
            cors_origins: parse_origins(&var_or("CORS_ORIGINS", "")),
            nws_base_url: var_or("NWS_BASE_URL", DEFAULT_NWS_BASE_URL),
            nws_user_agent: var_or("NWS_USER_AGENT", "contact@example.com"),
            geocoding_base_url: var_or("GEOCODING_BASE_URL", DEFAULT_GEOCODING_BASE_URL),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == AppEnv::Production
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a lifetime such as `604800`, `7d`, `12h`, `30m` or `45s` into seconds.
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs).filter(|s| *s > 0);
    }

    let split = raw.len().checked_sub(1)?;
    let (value, unit) = raw.split_at(split);
    let value: u64 = value.parse().ok()?;
    let multiplier = match unit {
        "d" => 24 * 60 * 60,
        "h" => 60 * 60,
        "m" => 60,
        "s" => 1,
        _ => return None,
    };

    value.checked_mul(multiplier).filter(|s| *s > 0)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
