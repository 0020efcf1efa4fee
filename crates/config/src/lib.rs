//! Configuration loading, validation, and management for rolechat.
//!
//! Loads configuration from `~/.rolechat/config.toml` with environment
//! variable overrides (`OPENAI_API_KEY`, `OPENAI_PROXY_URL`,
//! `ROLECHAT_CONFIG`). All engine tunables — model/provider defaults,
//! embedding dimensionality, retrieval depth, retry policy — live here so
//! the engine itself carries no ambient process state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The root configuration structure.
///
/// Maps directly to `~/.rolechat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key. Overridable via `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider base URL. Overridable via `OPENAI_PROXY_URL`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default provider name.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default chat model.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature.
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Path to the flat role directory file.
    #[serde(default = "default_roles_path")]
    pub roles_path: PathBuf,

    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Knowledge retrieval configuration.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Streaming retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_roles_path() -> PathBuf {
    config_dir().join("roles.json")
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("roles_path", &self.roles_path)
            .field("storage", &self.storage)
            .field("knowledge", &self.knowledge)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Which store backs sessions and messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "sqlite" or "memory".
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// SQLite database path.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_backend() -> String {
    "sqlite".into()
}
fn default_storage_path() -> PathBuf {
    config_dir().join("rolechat.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: default_storage_backend(), path: default_storage_path() }
    }
}

/// Knowledge retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Root directory holding `index.json` and per-role knowledge files.
    #[serde(default = "default_knowledge_root")]
    pub root: PathBuf,

    /// How many ranked items to inject per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Embedding model for similarity ranking.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Fixed embedding dimensionality.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
}

fn default_knowledge_root() -> PathBuf {
    config_dir().join("role_knowledge")
}
fn default_top_k() -> usize {
    3
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dimensions() -> u32 {
    1024
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            root: default_knowledge_root(),
            top_k: default_top_k(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

/// Streaming retry policy: `max_retries` additional attempts after the
/// first, with fixed backoff delays between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before retry N is `backoff_ms[N]`, clamped to the last entry.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,
}

fn default_max_retries() -> u32 {
    2
}
fn default_backoff_ms() -> Vec<u64> {
    vec![500, 1500]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: default_max_retries(), backoff_ms: default_backoff_ms() }
    }
}

impl RetryConfig {
    /// Backoff before retry attempt `n` (0-based).
    pub fn backoff_for(&self, n: usize) -> std::time::Duration {
        let ms = self
            .backoff_ms
            .get(n)
            .or_else(|| self.backoff_ms.last())
            .copied()
            .unwrap_or(500);
        std::time::Duration::from_millis(ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            roles_path: default_roles_path(),
            storage: StorageConfig::default(),
            knowledge: KnowledgeConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The rolechat config directory: `~/.rolechat`.
pub fn config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rolechat")
}

/// Default config file path, honoring `ROLECHAT_CONFIG`.
pub fn config_path() -> PathBuf {
    std::env::var_os("ROLECHAT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("config.toml"))
}

impl AppConfig {
    /// Load configuration from the given path, falling back to defaults when
    /// the file does not exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
            toml::from_str(&raw)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("OPENAI_PROXY_URL") {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
    }

    /// Validate settings that would otherwise fail deep inside the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::Invalid("default_model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::Invalid(format!(
                "default_temperature {} out of range [0.0, 2.0]",
                self.default_temperature
            )));
        }
        if self.knowledge.embedding_dimensions == 0 {
            return Err(ConfigError::Invalid("embedding_dimensions must be > 0".into()));
        }
        match self.storage.backend.as_str() {
            "sqlite" | "memory" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown storage backend '{other}' (expected 'sqlite' or 'memory')"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.knowledge.top_k, 3);
        assert_eq!(config.knowledge.embedding_dimensions, 1024);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.backoff_ms, vec![500, 1500]);
    }

    #[test]
    fn backoff_clamps_to_last_entry() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff_for(0).as_millis(), 500);
        assert_eq!(retry.backoff_for(1).as_millis(), 1500);
        assert_eq!(retry.backoff_for(5).as_millis(), 1500);
    }

    #[test]
    fn parses_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            default_model = "gpt-4o"

            [knowledge]
            top_k = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.knowledge.top_k, 5);
        // Untouched sections keep defaults
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn rejects_bad_backend() {
        let config: AppConfig = toml::from_str(
            r#"
            [storage]
            backend = "redis"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig { api_key: Some("sk-secret".into()), ..Default::default() };
        let out = format!("{config:?}");
        assert!(!out.contains("sk-secret"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.default_provider, "openai");
    }
}
