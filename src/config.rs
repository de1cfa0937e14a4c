//! Configuration types, built from environment variables.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Twilio Verify API host.
pub const DEFAULT_VERIFY_BASE_URL: &str = "https://verify.twilio.com";

/// Request timeout for calls to the verify provider and the lead webhooks.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound HTTP client with a whole-request timeout.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        })
}

/// Credentials for the hosted verification service. Server-side only.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Account identifier (`TWILIO_ACCOUNT_SID`).
    pub account_sid: String,
    /// Auth token (`TWILIO_AUTH_TOKEN`).
    pub auth_token: SecretString,
    /// Verification service identifier (`TWILIO_VERIFY_SERVICE_SID`).
    pub service_sid: String,
    /// API base URL, overridable with `TWILIO_VERIFY_BASE_URL`.
    pub base_url: String,
}

impl VerifyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let account_sid = required(&lookup, "TWILIO_ACCOUNT_SID")?;
        let auth_token = required(&lookup, "TWILIO_AUTH_TOKEN")?;
        let service_sid = required(&lookup, "TWILIO_VERIFY_SERVICE_SID")?;
        let base_url = lookup("TWILIO_VERIFY_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_VERIFY_BASE_URL.to_string());

        Ok(Self {
            account_sid,
            auth_token: SecretString::from(auth_token),
            service_sid,
            base_url,
        })
    }
}

/// Outbound webhook endpoints for captured leads.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Marketing automation hook, receives JSON.
    pub primary_url: String,
    /// Spreadsheet backup, receives multipart form fields. Optional.
    pub backup_url: Option<String>,
}

impl DispatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let primary_url = required(&lookup, "LEAD_PRIMARY_WEBHOOK_URL")?;
        let backup_url = lookup("LEAD_BACKUP_WEBHOOK_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            primary_url,
            backup_url,
        })
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Quiz sessions idle longer than this are swept.
    pub session_idle_timeout: Duration,
    /// Origin allowed by CORS. `None` allows any origin.
    pub allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            session_idle_timeout: Duration::from_secs(30 * 60),
            allowed_origin: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("FUNNEL_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "FUNNEL_PORT".into(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            None => defaults.port,
        };

        let session_idle_timeout = match lookup("FUNNEL_SESSION_IDLE_MIN") {
            Some(raw) => {
                let minutes: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "FUNNEL_SESSION_IDLE_MIN".into(),
                    message: format!("'{raw}' is not a whole number of minutes"),
                })?;
                Duration::from_secs(minutes * 60)
            }
            None => defaults.session_idle_timeout,
        };

        let allowed_origin = lookup("FUNNEL_ALLOWED_ORIGIN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "*");

        Ok(Self {
            port,
            session_idle_timeout,
            allowed_origin,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
