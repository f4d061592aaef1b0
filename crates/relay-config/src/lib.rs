use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_PIPELINE_ID: &str = "67d8f0fa8e9326b58bc21c3c";
pub const DEFAULT_BACKEND_URL: &str = "https://platform-api.aixplain.com";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_SDK_TIMEOUT_SECS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Config Structs
// ─────────────────────────────────────────────────────────────────────────────

/// Vendor endpoint and credentials.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub access_key: Option<String>,
    pub pipeline_id: String,
    pub backend_url: String,
    pub sdk_timeout: Duration,
}

impl UpstreamConfig {
    /// `POST` target for both run paths.
    pub fn run_url(&self) -> String {
        format!(
            "{}/assets/pipeline/execution/run/{}",
            self.backend_url.trim_end_matches('/'),
            self.pipeline_id
        )
    }

    /// Pipeline metadata lookup used at startup.
    pub fn metadata_url(&self) -> String {
        format!(
            "{}/sdk/pipelines/{}",
            self.backend_url.trim_end_matches('/'),
            self.pipeline_id
        )
    }
}

/// Fixed-count polling of asynchronous jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub upstream: UpstreamConfig,
    pub poll: PollPolicy,
    /// Only URL segments are read from SDK results when set.
    pub legacy_extraction: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

impl RelayConfig {
    /// Reads the process environment. Callers load `.env` beforehand.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_key = lookup("AIXPLAIN_ACCESS_KEY").filter(|k| !k.trim().is_empty());
        if access_key.is_none() {
            warn!("AIXPLAIN_ACCESS_KEY not set; pipeline will not be initialized");
        }

        let upstream = UpstreamConfig {
            access_key,
            pipeline_id: lookup("AIXPLAIN_PIPELINE_ID").unwrap_or_else(|| DEFAULT_PIPELINE_ID.into()),
            backend_url: lookup("AIXPLAIN_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.into()),
            sdk_timeout: Duration::from_secs(parse_or(
                &lookup,
                "RELAY_SDK_TIMEOUT_SECS",
                DEFAULT_SDK_TIMEOUT_SECS,
            )?),
        };

        let poll = PollPolicy {
            max_attempts: parse_or(&lookup, "RELAY_POLL_ATTEMPTS", DEFAULT_POLL_ATTEMPTS)?,
            interval: Duration::from_millis(parse_or(
                &lookup,
                "RELAY_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            upstream,
            poll,
            legacy_extraction: parse_or(&lookup, "RELAY_LEGACY_EXTRACTION", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
