//! Configuration module
//!
//! Client configuration is read from the environment (after loading a `.env`
//! file if present) and validated before any component is built.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_PREFIX, DEFAULT_API_URL, DEFAULT_EVICT_DELAY_MS, DEFAULT_HTTP_TIMEOUT_SECS,
};

/// Client configuration shared by the API client, the session and the CLI.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the document service, without trailing slash.
    pub api_url: String,
    /// Path prefix under which the service mounts its routes (e.g. "/api").
    pub api_prefix: String,
    pub http_timeout: Duration,
    /// How long a completed upload job stays in the queue.
    pub evict_delay: Duration,
    pub environment: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            evict_delay: Duration::from_millis(DEFAULT_EVICT_DELAY_MS),
            environment: "development".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// `DOCDESK_API_URL` falls back to `API_URL`. Numeric values that fail to
    /// parse are reported instead of silently replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("DOCDESK_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or(defaults.api_url);

        let api_prefix = lookup("DOCDESK_API_PREFIX").unwrap_or(defaults.api_prefix);

        let http_timeout = match lookup("DOCDESK_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                anyhow::anyhow!("DOCDESK_HTTP_TIMEOUT_SECS must be a whole number of seconds")
            })?),
            None => defaults.http_timeout,
        };

        let evict_delay = match lookup("DOCDESK_EVICT_DELAY_MS") {
            Some(raw) => Duration::from_millis(raw.trim().parse().map_err(|_| {
                anyhow::anyhow!("DOCDESK_EVICT_DELAY_MS must be a whole number of milliseconds")
            })?),
            None => defaults.evict_delay,
        };

        let environment = lookup("DOCDESK_ENVIRONMENT")
            .or_else(|| lookup("ENVIRONMENT"))
            .unwrap_or(defaults.environment);

        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            api_prefix: normalize_prefix(&api_prefix),
            http_timeout,
            evict_delay,
            environment,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("DOCDESK_API_URL cannot be empty"));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "DOCDESK_API_URL must start with http:// or https://, got '{}'",
                self.api_url
            ));
        }
        if self.http_timeout.is_zero() {
            return Err(anyhow::anyhow!("DOCDESK_HTTP_TIMEOUT_SECS must be greater than 0"));
        }
        Ok(())
    }

    /// Check if the client is running against a production deployment
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Base URL including the route prefix, e.g. `http://localhost:8000/api`.
    pub fn service_url(&self) -> String {
        format!("{}{}", self.api_url, self.api_prefix)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
