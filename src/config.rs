//! Configuration file parser for ~/.config/blockwise/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde, though we log a warning when
//! the file contains potential typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks both API keys to prevent secret leakage in logs,
/// error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the news provider's API.
    pub news_base_url: String,

    /// Base URL of the language-model provider's API.
    pub llm_base_url: String,

    /// Chat-completion model used for summaries.
    pub llm_model: String,

    /// News provider API key (alternative to NEWS_API_KEY env var).
    /// Env var takes precedence over config file.
    pub news_api_key: Option<String>,

    /// Language-model API key (alternative to OPENAI_API_KEY env var).
    /// Env var takes precedence over config file.
    pub llm_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            news_base_url: "https://newsapi.org/v2".to_string(),
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-3.5-turbo".to_string(),
            news_api_key: None,
            llm_api_key: None,
        }
    }
}

/// Mask both API keys in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("news_base_url", &self.news_base_url)
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to prevent memory exhaustion from a
        // maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "news_base_url",
                "llm_base_url",
                "llm_model",
                "news_api_key",
                "llm_api_key",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), model = %config.llm_model, "Loaded configuration");
        Ok(config)
    }

    /// News API key: `NEWS_API_KEY` env var, else the config file value.
    pub fn news_key(&self) -> Option<SecretString> {
        key_from_env_or_config("NEWS_API_KEY", self.news_api_key.as_deref())
    }

    /// LLM API key: `OPENAI_API_KEY` env var, else the config file value.
    pub fn llm_key(&self) -> Option<SecretString> {
        key_from_env_or_config("OPENAI_API_KEY", self.llm_api_key.as_deref())
    }
}

fn key_from_env_or_config(env_var: &str, config_value: Option<&str>) -> Option<SecretString> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Some(SecretString::from(value));
        }
    }
    config_value.map(SecretString::from)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.news_base_url, "https://newsapi.org/v2");
        assert_eq!(config.llm_base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm_model, "gpt-3.5-turbo");
        assert!(config.news_api_key.is_none());
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/blockwise_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.llm_model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("blockwise_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.news_base_url, "https://newsapi.org/v2");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("blockwise_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "llm_model = \"gpt-4o-mini\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.llm_model, "gpt-4o-mini");
        assert_eq!(config.news_base_url, "https://newsapi.org/v2"); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("blockwise_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
news_base_url = "http://127.0.0.1:9000/v2"
llm_base_url = "http://127.0.0.1:9001/v1"
llm_model = "gpt-4o"
news_api_key = "news-key-123"
llm_api_key = "llm-key-456"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.news_base_url, "http://127.0.0.1:9000/v2");
        assert_eq!(config.llm_base_url, "http://127.0.0.1:9001/v1");
        assert_eq!(config.llm_model, "gpt-4o");
        assert_eq!(config.news_api_key.as_deref(), Some("news-key-123"));
        assert_eq!(config.llm_api_key.as_deref(), Some("llm-key-456"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("blockwise_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("blockwise_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
llm_model = "gpt-3.5-turbo"
totally_fake_key = "should not fail"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.llm_model, "gpt-3.5-turbo");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("blockwise_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::TooLarge(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_api_keys() {
        let config = Config {
            news_api_key: Some("super-secret-news-key".to_string()),
            llm_api_key: Some("super-secret-llm-key".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-news-key"));
        assert!(!debug_output.contains("super-secret-llm-key"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_config_key_used_when_env_absent() {
        let config = Config {
            news_api_key: Some("from-config".to_string()),
            ..Config::default()
        };
        // Uses a throwaway env var name indirectly: news_key reads
        // NEWS_API_KEY, which tests must not set globally; only assert the
        // config fallback path when it is unset.
        if std::env::var("NEWS_API_KEY").is_err() {
            assert!(config.news_key().is_some());
        }
    }
}
