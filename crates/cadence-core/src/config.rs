//! Config - scheduler の設定
//!
//! JSON ファイル（serde_json）を読み、`CADENCE_*` 環境変数で上書きする。
//! どの項目も省略可能で、省略時は既定値（毎時 0 分に tick、timeout 30 秒、in-call retry なし）。
//!
//! | key                     | env                           | 既定値        |
//! |-------------------------|-------------------------------|---------------|
//! | tick_interval_secs      | CADENCE_TICK_INTERVAL_SECS    | 3600          |
//! | align_to_interval       | CADENCE_ALIGN_TO_INTERVAL     | true          |
//! | publish_timeout_secs    | CADENCE_PUBLISH_TIMEOUT_SECS  | 30            |
//! | retry.max_attempts      | CADENCE_RETRY_MAX_ATTEMPTS    | 1             |
//! | retry.base_delay_ms     | CADENCE_RETRY_BASE_DELAY_MS   | 2000          |
//! | retry.multiplier        | CADENCE_RETRY_MULTIPLIER      | 2.0           |
//! | retry.max_delay_ms      | CADENCE_RETRY_MAX_DELAY_MS    | 300000        |
//! | credential_keys.*       | CADENCE_ACCESS_TOKEN_KEY / CADENCE_AUTHOR_KEY | linkedin_access_token / linkedin_urn |
//! | media_handle_prefix     | CADENCE_MEDIA_HANDLE_PREFIX   | urn:li:       |

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::RetryPolicy;
use crate::ports::CredentialKeys;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

/// Upper bound for `retry.max_attempts`.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            multiplier: policy.multiplier,
            max_delay_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_interval_secs: u64,
    pub align_to_interval: bool,
    pub publish_timeout_secs: u64,
    pub retry: RetryConfig,
    pub credential_keys: CredentialKeys,
    pub media_handle_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 3600,
            align_to_interval: true,
            publish_timeout_secs: 30,
            retry: RetryConfig::default(),
            credential_keys: CredentialKeys::default(),
            media_handle_prefix: "urn:li:".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `CADENCE_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any `CADENCE_*` lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = parsed(&lookup, "CADENCE_TICK_INTERVAL_SECS")? {
            self.tick_interval_secs = v;
        }
        if let Some(v) = parsed(&lookup, "CADENCE_ALIGN_TO_INTERVAL")? {
            self.align_to_interval = v;
        }
        if let Some(v) = parsed(&lookup, "CADENCE_PUBLISH_TIMEOUT_SECS")? {
            self.publish_timeout_secs = v;
        }
        if let Some(v) = parsed(&lookup, "CADENCE_RETRY_MAX_ATTEMPTS")? {
            self.retry.max_attempts = v;
        }
        if let Some(v) = parsed(&lookup, "CADENCE_RETRY_BASE_DELAY_MS")? {
            self.retry.base_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "CADENCE_RETRY_MULTIPLIER")? {
            self.retry.multiplier = v;
        }
        if let Some(v) = parsed(&lookup, "CADENCE_RETRY_MAX_DELAY_MS")? {
            self.retry.max_delay_ms = v;
        }
        if let Some(v) = lookup("CADENCE_ACCESS_TOKEN_KEY") {
            self.credential_keys.access_token = v;
        }
        if let Some(v) = lookup("CADENCE_AUTHOR_KEY") {
            self.credential_keys.author = v;
        }
        if let Some(v) = lookup("CADENCE_MEDIA_HANDLE_PREFIX") {
            self.media_handle_prefix = v;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid("tick_interval_secs must be > 0".into()));
        }
        if self.publish_timeout_secs == 0 {
            return Err(ConfigError::Invalid("publish_timeout_secs must be > 0".into()));
        }
        if !(1..=MAX_RETRY_ATTEMPTS).contains(&self.retry.max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "retry.max_attempts must be between 1 and {MAX_RETRY_ATTEMPTS}"
            )));
        }
        if self.retry.max_delay_ms == 0 {
            return Err(ConfigError::Invalid("retry.max_delay_ms must be > 0".into()));
        }
        if !(self.retry.multiplier.is_finite() && self.retry.multiplier >= 1.0) {
            return Err(ConfigError::Invalid("retry.multiplier must be >= 1.0".into()));
        }
        if self.credential_keys.access_token.trim().is_empty()
            || self.credential_keys.author.trim().is_empty()
        {
            return Err(ConfigError::Invalid("credential keys must not be blank".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            multiplier: self.retry.multiplier,
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidOverride { key, value: raw }),
    }
}
