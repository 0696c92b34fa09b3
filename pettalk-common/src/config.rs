//! Configuration model and config file resolution
//!
//! The TOML file is optional. Resolution order for the file itself:
//! 1. Explicit path (command-line argument)
//! 2. `PETTALK_CONFIG` environment variable
//! 3. `<config_dir>/pettalk/config.toml`
//!
//! When no file is found every section falls back to built-in defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PETTALK_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Remote analysis service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Base URL of the analysis service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path accepting the multipart clip upload
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Path exposing the most recent analysis record
    #[serde(default = "default_result_path")]
    pub result_path: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default)]
    pub user_token: Option<String>,

    /// Referer header some deployments require
    #[serde(default)]
    pub referer: Option<String>,

    /// Poll attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before each poll attempt
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-request network timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// "fail-closed" or "best-effort"
    #[serde(default = "default_mismatch_policy")]
    pub mismatch_policy: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_path: default_upload_path(),
            result_path: default_result_path(),
            client_id: None,
            secret_key: None,
            user_token: None,
            referer: None,
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            mismatch_policy: default_mismatch_policy(),
        }
    }
}

/// Clip extraction settings for the upload path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Sample rate declared and produced for uploaded clips
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,

    /// Keep source channels instead of mixing down to mono
    #[serde(default)]
    pub preserve_channels: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: default_target_sample_rate(),
            preserve_channels: false,
        }
    }
}

/// Local persistence settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the session store and blob records
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://pippo.petpuls.net".to_string()
}

fn default_upload_path() -> String {
    "/emo2/v1/analysis/request".to_string()
}

fn default_result_path() -> String {
    "/emo2/v1/analysis/result".to_string()
}

fn default_max_attempts() -> u32 {
    30
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_mismatch_policy() -> String {
    "fail-closed".to_string()
}

fn default_target_sample_rate() -> u32 {
    16_000
}

/// Locate the config file, if any.
///
/// An explicit path is returned even when it does not exist so the caller can
/// report it; implicit locations are only returned when present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("pettalk").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load the TOML configuration.
///
/// A missing file yields defaults with a warning; an unreadable or malformed
/// file is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// OS-dependent default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pettalk"))
        .unwrap_or_else(|| PathBuf::from("./pettalk_data"))
}
