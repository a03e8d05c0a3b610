use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ClientError;

pub const CLAIMS_API_URL_ENV: &str = "CLAIMS_API_URL";
pub const CLAIMS_API_ACCESS_TOKEN_ENV: &str = "CLAIMS_API_ACCESS_TOKEN";
pub const CLAIMS_API_TIMEOUT_MS_ENV: &str = "CLAIMS_API_TIMEOUT_MS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8082";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 30_000;

/// Connection settings for the claims-data API.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ClaimsApiConfig {
    pub base_url: String,
    pub access_token: String,
    pub timeout_ms: u64,
}

impl ClaimsApiConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] when the access token is missing or blank.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// The base URL loses any trailing slash, and the timeout is clamped to
    /// 100..=30000 ms, with unparseable values falling back to the default.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] when the access token is missing or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(CLAIMS_API_URL_ENV)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let access_token = lookup(CLAIMS_API_ACCESS_TOKEN_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ClientError::Config(format!("{CLAIMS_API_ACCESS_TOKEN_ENV} must be set"))
            })?;

        let timeout_ms = lookup(CLAIMS_API_TIMEOUT_MS_ENV)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT_MS, |value| value.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS));

        Ok(Self { base_url, access_token, timeout_ms })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
