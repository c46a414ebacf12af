//! Application configuration loaded from environment variables.
//!
//! Secrets arrive as environment variables (Cloud Run secret bindings or a
//! local `.env` file) and are read once at startup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL, used for CORS and magic-link targets
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Session token lifetime in days
    pub jwt_ttl_days: i64,
    /// Minimum seconds between magic-link requests for one address
    pub magic_link_cooldown_secs: u64,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Shared key the frontend sends in `X-API-Key`. `None` disables the check.
    pub api_key: Option<String>,
    /// Outbound mail relay. `None` means magic links are only logged.
    pub email: Option<EmailConfig>,
}

/// HTTP mail relay settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let email = match (env::var("EMAIL_API_URL"), env::var("EMAIL_API_KEY")) {
            (Ok(api_url), Ok(api_key)) => Some(EmailConfig {
                api_url,
                api_key: api_key.trim().to_string(),
                from: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "TalentHub <noreply@talenthub.local>".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_var("PORT", 8080)?,
            jwt_ttl_days: parse_var("JWT_TTL_DAYS", 7)?,
            magic_link_cooldown_secs: parse_var("MAGIC_LINK_COOLDOWN_SECS", 60)?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            api_key: env::var("API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            email,
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_ttl_days: 7,
            magic_link_cooldown_secs: 60,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            api_key: None,
            email: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
