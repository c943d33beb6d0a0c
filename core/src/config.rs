//! Client configuration loaded from TOML with environment overrides.
//!
//! ```toml
//! base_url = "http://127.0.0.1:3000"
//! default_filter = "Pending"
//!
//! [animation]
//! enabled = true
//! duration_ms = 250
//! easing = "ease-in-out"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::animate::Easing;
use crate::error::ConfigError;
use crate::filter::FilterTab;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Overrides `base_url`.
pub const ENV_BASE_URL: &str = "TODO_BASE_URL";
/// Overrides `default_filter`, matched case-insensitively against tab labels.
pub const ENV_DEFAULT_FILTER: &str = "TODO_DEFAULT_FILTER";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_filter: FilterTab,
    pub animation: AnimationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_filter: FilterTab::default(),
            animation: AnimationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub enabled: bool,
    pub duration_ms: u64,
    /// `"linear"` or `"ease-in-out"`.
    pub easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 250,
            easing: Easing::EaseInOut,
        }
    }
}

impl AnimationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply `TODO_BASE_URL` / `TODO_DEFAULT_FILTER` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; `with_env_overrides` passes
    /// the process environment.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_BASE_URL,
                    message: "must not be empty".to_string(),
                });
            }
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_FILTER) {
            self.default_filter = raw.parse().map_err(|e: crate::error::FilterParseError| {
                ConfigError::InvalidValue {
                    key: ENV_DEFAULT_FILTER,
                    message: e.to_string(),
                }
            })?;
        }
        Ok(self)
    }
}
