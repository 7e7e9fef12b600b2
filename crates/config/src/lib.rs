//! Configuration loading, validation, and management for roverctl.
//!
//! Loads configuration from `~/.roverctl/config.toml` with environment
//! variable overrides. Validates all settings at startup. The robot address
//! itself is NOT configuration — it is a required CLI argument, injected
//! into the device client at construction and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.roverctl/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reasoning engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Robot device settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// Conversation log pruning settings
    #[serde(default)]
    pub pruning: PruningConfig,

    /// Turn loop settings
    #[serde(default)]
    pub runner: RunnerConfig,
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
            .field("engine", &self.engine)
            .field("device", &self.device)
            .field("pruning", &self.pruning)
            .field("runner", &self.runner)
            .finish()
    }
}

/// Reasoning engine configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// API key (env vars take priority)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the chat-completions endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per engine response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-5".into()
}
fn default_temperature() -> f32 {
    1.0
}
fn default_max_output_tokens() -> u32 {
    4096
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Robot device configuration: timeouts, settle delays, photo archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Timeout for motor requests, seconds
    #[serde(default = "default_motor_timeout")]
    pub motor_timeout_secs: u64,

    /// Timeout for stop/status requests, seconds
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,

    /// Timeout for camera requests, seconds
    #[serde(default = "default_photo_timeout")]
    pub photo_timeout_secs: u64,

    /// Directory for archived photos (created on demand)
    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,

    /// Pause after a motor command before capturing a photo, milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Pause between moves inside a batch, milliseconds
    #[serde(default = "default_inter_move_settle_ms")]
    pub inter_move_settle_ms: u64,
}

fn default_motor_timeout() -> u64 {
    10
}
fn default_status_timeout() -> u64 {
    5
}
fn default_photo_timeout() -> u64 {
    10
}
fn default_photos_dir() -> PathBuf {
    PathBuf::from("photos")
}
fn default_settle_ms() -> u64 {
    200
}
fn default_inter_move_settle_ms() -> u64 {
    100
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            motor_timeout_secs: default_motor_timeout(),
            status_timeout_secs: default_status_timeout(),
            photo_timeout_secs: default_photo_timeout(),
            photos_dir: default_photos_dir(),
            settle_ms: default_settle_ms(),
            inter_move_settle_ms: default_inter_move_settle_ms(),
        }
    }
}

/// Conversation log pruning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruningConfig {
    /// Number of most-recent turns whose items are guaranteed retained
    #[serde(default = "default_retention_turns")]
    pub retention_turns: usize,

    /// Empirical items-per-turn estimate; tunable, not a hard constant
    #[serde(default = "default_items_per_turn")]
    pub items_per_turn: usize,
}

fn default_retention_turns() -> usize {
    5
}
fn default_items_per_turn() -> usize {
    4
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            retention_turns: default_retention_turns(),
            items_per_turn: default_items_per_turn(),
        }
    }
}

/// Turn loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Soft cap on turns per task; exhaustion surfaces whatever output exists
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_max_turns() -> u32 {
    100
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.roverctl/config.toml).
    ///
    /// Also checks environment variables for the engine API key:
    /// - `ROVERCTL_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    /// And for the model: `ROVERCTL_MODEL`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.engine.api_key.is_none() {
            config.engine.api_key = std::env::var("ROVERCTL_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("ROVERCTL_MODEL") {
            config.engine.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".roverctl")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.engine.temperature) {
            return Err(ConfigError::ValidationError(
                "engine.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.pruning.retention_turns == 0 {
            return Err(ConfigError::ValidationError(
                "pruning.retention_turns must be at least 1".into(),
            ));
        }

        if self.pruning.items_per_turn == 0 {
            return Err(ConfigError::ValidationError(
                "pruning.items_per_turn must be at least 1".into(),
            ));
        }

        if self.runner.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "runner.max_turns must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an engine API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.engine.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            device: DeviceConfig::default(),
            pruning: PruningConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.engine.model, "gpt-5");
        assert_eq!(config.pruning.retention_turns, 5);
        assert_eq!(config.pruning.items_per_turn, 4);
        assert_eq!(config.runner.max_turns, 100);
        assert_eq!(config.device.settle_ms, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.engine.model, config.engine.model);
        assert_eq!(parsed.device.photos_dir, config.device.photos_dir);
        assert_eq!(parsed.pruning.retention_turns, config.pruning.retention_turns);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            engine: EngineConfig {
                temperature: 5.0,
                ..EngineConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retention_rejected() {
        let config = AppConfig {
            pruning: PruningConfig {
                retention_turns: 0,
                items_per_turn: 4,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.engine.model, "gpt-5");
    }

    #[test]
    fn partial_config_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[pruning]
retention_turns = 8

[device]
photos_dir = "captures"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.pruning.retention_turns, 8);
        assert_eq!(config.pruning.items_per_turn, 4); // default survives
        assert_eq!(config.device.photos_dir, PathBuf::from("captures"));
        assert_eq!(config.engine.model, "gpt-5");
    }

    #[test]
    fn api_key_never_in_debug_output() {
        let config = AppConfig {
            engine: EngineConfig {
                api_key: Some("sk-secret".into()),
                ..EngineConfig::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
