//! Editor configuration with environment overrides.
//!
//! [`EditorConfig`] holds the few knobs the editor has. Front ends start from
//! [`EditorConfig::from_env`] and then apply command-line flags on top.

use std::time::Duration;

use crate::error::EditorError;

/// Default API base path.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/editor";

pub const ENV_BASE_URL: &str = "NPC_EDITOR_URL";
pub const ENV_TIMEOUT_SECS: &str = "NPC_EDITOR_TIMEOUT_SECS";
pub const ENV_STATUS_SECS: &str = "NPC_EDITOR_STATUS_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// API base URL, without a trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,
    /// Per-request timeout. Default: 30s.
    pub timeout: Duration,
    /// How long a status message stays visible. Default: 3s.
    pub status_ttl: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            status_ttl: Duration::from_secs(3),
        }
    }
}

impl EditorConfig {
    /// Defaults overridden by `NPC_EDITOR_*` environment variables.
    pub fn from_env() -> Result<Self, EditorError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EditorError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(parse_secs(ENV_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_STATUS_SECS) {
            config.status_ttl = Duration::from_secs(parse_secs(ENV_STATUS_SECS, &raw)?);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = ttl;
        self
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<u64, EditorError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| EditorError::Config(format!("{name} must be whole seconds, got '{raw}'")))
}
