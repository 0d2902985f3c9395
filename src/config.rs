//! Application configuration loaded from environment variables.
//!
//! Secrets (the identity provider's anon key and JWT secret) arrive as
//! environment variables through the deployment's secret bindings.

use crate::services::profile::{RetryPolicy, DEFAULT_PROFILE_ATTEMPTS};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where check-ins and profiles are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBackend {
    Firestore,
    /// Process-local store, lost on restart. For local runs and tests.
    Memory,
}

impl FromStr for DataBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(DataBackend::Firestore),
            "memory" => Ok(DataBackend::Memory),
            other => Err(ConfigError::Invalid("DATA_BACKEND", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Identity provider project URL (e.g. https://abc.supabase.co)
    pub auth_url: String,
    /// Frontend URL (CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub data_backend: DataBackend,
    /// Profile lookups per load, including the first
    pub profile_retry_attempts: u32,
    pub profile_retry_delay: Duration,

    // --- Secrets ---
    /// Identity provider public API key
    pub auth_anon_key: String,
    /// JWT secret shared with the identity provider (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            auth_url: env::var("AUTH_URL")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_URL"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            data_backend: match env::var("DATA_BACKEND") {
                Ok(v) => v.parse()?,
                Err(_) => DataBackend::Firestore,
            },
            profile_retry_attempts: env::var("PROFILE_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PROFILE_ATTEMPTS),
            profile_retry_delay: Duration::from_millis(
                env::var("PROFILE_RETRY_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),

            auth_anon_key: env::var("AUTH_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_ANON_KEY"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Config for tests: in-memory backend, no real identity provider.
    pub fn test_default() -> Self {
        Self {
            auth_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            data_backend: DataBackend::Memory,
            profile_retry_attempts: DEFAULT_PROFILE_ATTEMPTS,
            profile_retry_delay: Duration::from_millis(1),
            auth_anon_key: "test_anon_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    pub fn profile_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.profile_retry_attempts,
            delay: self.profile_retry_delay,
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
