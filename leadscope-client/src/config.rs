//! Configuration loading for the Leadscope client.
//!
//! All top-level fields are required. The `auth` and `cache` sections and
//! fields typed `Option` may be omitted.

use crate::coordinator::CoordinatorConfig;
use leadscope_cache::{CacheConfig, InvalidationPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on lookahead, to keep a misconfigured client from flooding
/// the API.
const MAX_PREFETCH_DEPTH: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub prefetch_depth: u32,
    #[serde(default)]
    pub visible_only: Option<bool>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub invalidation: InvalidationPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or LEADSCOPE_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounce_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.prefetch_depth > MAX_PREFETCH_DEPTH {
            return Err(ConfigError::InvalidValue {
                field: "prefetch_depth",
                reason: format!("must be <= {MAX_PREFETCH_DEPTH}"),
            });
        }
        if self.cache.max_entries == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_entries",
                reason: "must be > 0 when set".to_string(),
            });
        }
        if let Some(token) = &self.auth.bearer_token {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "auth.bearer_token",
                    reason: "must not be empty when set".to_string(),
                });
            }
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_max_entries(self.cache.max_entries.unwrap_or(0))
            .with_invalidation(self.cache.invalidation)
    }

    /// Runtime settings for the [`QueryCoordinator`](crate::QueryCoordinator).
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::new()
            .with_page_size(self.page_size)
            .with_request_timeout(self.request_timeout())
            .with_debounce(Duration::from_millis(self.debounce_ms))
            .with_prefetch_depth(self.prefetch_depth)
            .with_cache(self.cache_config())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("LEADSCOPE_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
api_base_url = "http://localhost:8000/api"
request_timeout_ms = 10000
page_size = 50
debounce_ms = 300
prefetch_depth = 2
visible_only = true

[auth]
bearer_token = "secret"

[cache]
max_entries = 500
invalidation = "keep_entries"

[logging]
filter = "leadscope=debug,info"
json = false
"#;

    #[test]
    fn test_parse_full_config() {
        let config = ClientConfig::from_toml_str(FULL).unwrap();
        config.validate().unwrap();
        assert_eq!(config.visible_only, Some(true));
        assert_eq!(config.auth.bearer_token.as_deref(), Some("secret"));
        assert_eq!(config.cache.invalidation, InvalidationPolicy::KeepEntries);

        let coordinator = config.coordinator_config();
        assert_eq!(coordinator.page_size, 50);
        assert_eq!(coordinator.debounce, Duration::from_millis(300));
        assert_eq!(coordinator.request_timeout, Duration::from_secs(10));
        assert_eq!(coordinator.cache.max_entries.map(|n| n.get()), Some(500));
    }

    #[test]
    fn test_optional_sections_default() {
        let minimal = r#"
api_base_url = "https://leads.example.com"
request_timeout_ms = 5000
page_size = 25
debounce_ms = 300
prefetch_depth = 0

[logging]
filter = "info"
json = true
"#;
        let config = ClientConfig::from_toml_str(minimal).unwrap();
        config.validate().unwrap();
        assert!(config.auth.bearer_token.is_none());
        assert!(config.cache.max_entries.is_none());
        assert_eq!(config.cache.invalidation, InvalidationPolicy::ClearAll);
        assert!(config.cache_config().max_entries.is_none());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let with_extra = format!("{FULL}\nretries = 3\n");
        assert!(matches!(
            ClientConfig::from_toml_str(&with_extra),
            Err(ConfigError::Parse(_))
        ));
    }
}
