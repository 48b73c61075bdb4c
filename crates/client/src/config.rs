//! Configuration loading and validation for the hybrid-unwrap client.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Full URL of the encrypt endpoint.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Bearer credential sent in the `Authorization` header. **Required.**
    pub bearer_token: BearerToken,

    /// Skip TLS certificate verification for this client only. Development
    /// servers with self-signed certificates need this; never enable it
    /// against a production endpoint.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Upper bound (seconds) on the whole HTTP round trip.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Bearer credential. Its value never appears in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

fn default_endpoint_url() -> String {
    "https://localhost/api/test/encrypt".into()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.bearer_token.expose().trim().is_empty() {
            anyhow::bail!("BEARER_TOKEN is required and must not be empty");
        }
        let url = reqwest::Url::parse(&self.endpoint_url)
            .with_context(|| format!("ENDPOINT_URL is not a valid URL: {}", self.endpoint_url))?;
        if !matches!(url.scheme(), "https" | "http") {
            anyhow::bail!("ENDPOINT_URL must use http or https, got {}", url.scheme());
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}
