//! Configuration Loader
//!
//! Loads and validates the relay configuration from a TOML file. Every
//! section is optional; a missing section falls back to the built-in
//! defaults, so running without a file is equivalent to an empty file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::circular::{CircularConfig, TokenListQuery};
use crate::adapters::forwarder::{ForwarderConfig, DEFAULT_FORWARD_URL};
use crate::application::PipelineConfig;
use crate::domain::outcome::StatusPolicy;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "CIRCULAR_API_KEY";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub circular: CircularSection,
    pub tokens: TokenListQuery,
    pub cache: CacheSection,
    pub forwarder: ForwarderSection,
    pub pipeline: PipelineSection,
    pub logging: LoggingSection,
}

/// Circular API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircularSection {
    /// API base URL
    pub api_url: String,
    /// API key; falls back to CIRCULAR_API_KEY when empty or absent
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// "require_success" or "accept_json_body"
    pub status_policy: StatusPolicy,
}

impl Default for CircularSection {
    fn default() -> Self {
        Self {
            api_url: "https://pro.circular.bot".to_string(),
            api_key: None,
            timeout_secs: 30,
            status_policy: StatusPolicy::default(),
        }
    }
}

impl CircularSection {
    /// Get API key with environment variable fallback
    pub fn get_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())
    }
}

fn resolve_api_key(configured: Option<&str>, env: Option<String>) -> Option<String> {
    match configured {
        Some(key) if !key.trim().is_empty() => Some(key.to_string()),
        _ => env.filter(|k| !k.trim().is_empty()),
    }
}

/// Market cache section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Restrict the cache to Jupiter-routable markets
    pub only_jup: bool,
}

/// Local forwarding section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForwarderSection {
    /// Endpoint receiving one market per POST
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ForwarderSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_FORWARD_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Pipeline section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Pause between the token list and cache calls
    pub stage_delay_ms: u64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self { stage_delay_ms: 1000 }
    }
}

/// Logging section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.circular.api_url) {
            return Err(ConfigError::ValidationError(format!(
                "circular.api_url must be an http(s) URL, got '{}'",
                self.circular.api_url
            )));
        }

        if self.circular.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "circular.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.tokens.max_tokens_list == 0 {
            return Err(ConfigError::ValidationError(
                "tokens.max_tokens_list must be > 0".to_string(),
            ));
        }

        if self.tokens.base_token.is_empty() {
            return Err(ConfigError::ValidationError(
                "tokens.base_token cannot be empty".to_string(),
            ));
        }

        if !is_http_url(&self.forwarder.url) {
            return Err(ConfigError::ValidationError(format!(
                "forwarder.url must be an http(s) URL, got '{}'",
                self.forwarder.url
            )));
        }

        if self.forwarder.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "forwarder.timeout_secs must be > 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }

    /// Client settings for the Circular API; fails when no API key is available
    pub fn circular_config(&self) -> Result<CircularConfig, ConfigError> {
        let api_key = self.circular.get_api_key().ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "no API key: set circular.api_key or {}",
                API_KEY_ENV
            ))
        })?;

        Ok(CircularConfig {
            api_base_url: self.circular.api_url.clone(),
            api_key,
            timeout: Duration::from_secs(self.circular.timeout_secs),
            status_policy: self.circular.status_policy,
            token_query: self.tokens.clone(),
        })
    }

    pub fn forwarder_config(&self) -> ForwarderConfig {
        ForwarderConfig {
            url: self.forwarder.url.clone(),
            timeout: Duration::from_secs(self.forwarder.timeout_secs),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            stage_delay: Duration::from_millis(self.pipeline.stage_delay_ms),
            only_jup: self.cache.only_jup,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[circular]
api_url = "https://pro.circular.bot"
api_key = "file-key"
timeout_secs = 20
status_policy = "accept_json_body"

[tokens]
max_tokens_list = 25
max_time_range = 600
provider = "NO_PROVIDER"
base_token = "So11111111111111111111111111111111111111112"
exclude_tokens = ["EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"]

[cache]
only_jup = true

[forwarder]
url = "http://127.0.0.1:9000/add-market"
timeout_secs = 5

[pipeline]
stage_delay_ms = 250

[logging]
level = "debug"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.circular.timeout_secs, 20);
        assert_eq!(config.circular.status_policy, StatusPolicy::AcceptJsonBody);
        assert_eq!(config.tokens.max_tokens_list, 25);
        assert_eq!(config.tokens.exclude_tokens.len(), 1);
        assert!(config.cache.only_jup);
        assert_eq!(config.forwarder.url, "http://127.0.0.1:9000/add-market");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.circular.api_url, "https://pro.circular.bot");
        assert_eq!(config.circular.timeout_secs, 30);
        assert_eq!(config.tokens, TokenListQuery::default());
        assert!(!config.cache.only_jup);
        assert_eq!(config.forwarder.url, "http://localhost:8080/add-market");
        assert_eq!(config.pipeline.stage_delay_ms, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = format!("{}/config/relay.toml", env!("CARGO_MANIFEST_DIR"));
        let config = load_config(&path).unwrap();

        assert_eq!(config.tokens, TokenListQuery::default());
        assert_eq!(config.circular.status_policy, StatusPolicy::RequireSuccess);
        assert_eq!(config.forwarder.url, DEFAULT_FORWARD_URL);
        assert_eq!(config.pipeline.stage_delay_ms, 1000);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[circular\napi_url = ");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_status_policy_rejected() {
        let file = write_config("[circular]\nstatus_policy = \"sometimes\"\n");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_forwarder_url() {
        let file = write_config("[forwarder]\nurl = \"localhost:8080/add-market\"\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_timeout() {
        let file = write_config("[circular]\ntimeout_secs = 0\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_log_level() {
        let file = write_config("[logging]\nlevel = \"chatty\"\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_zero_token_cap_rejected() {
        let file = write_config("[tokens]\nmax_tokens_list = 0\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_resolve_api_key_prefers_config() {
        assert_eq!(
            resolve_api_key(Some("file-key"), Some("env-key".into())),
            Some("file-key".to_string())
        );
    }

    #[test]
    fn test_resolve_api_key_env_fallback() {
        assert_eq!(resolve_api_key(None, Some("env-key".into())), Some("env-key".to_string()));
        assert_eq!(resolve_api_key(Some("  "), Some("env-key".into())), Some("env-key".to_string()));
        assert_eq!(resolve_api_key(None, Some("".into())), None);
        assert_eq!(resolve_api_key(None, None), None);
    }

    #[test]
    fn test_config_to_component_configs() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let circular = config.circular_config().unwrap();
        assert_eq!(circular.api_key, "file-key");
        assert_eq!(circular.timeout, Duration::from_secs(20));
        assert_eq!(circular.status_policy, StatusPolicy::AcceptJsonBody);
        assert_eq!(circular.token_query.max_tokens_list, 25);

        let forwarder = config.forwarder_config();
        assert_eq!(forwarder.timeout, Duration::from_secs(5));

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.stage_delay, Duration::from_millis(250));
        assert!(pipeline.only_jup);
    }
}
