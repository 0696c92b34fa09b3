//! Editor runtime settings
//!
//! Settings are resolved once at startup, in priority order:
//! 1. Command-line arguments (and their environment fallbacks)
//! 2. TOML configuration file
//! 3. Built-in defaults

use crate::analysis::client::ClientConfig;
use crate::analysis::poller::{MismatchPolicy, PollSettings};
use crate::audio::types::OutputFormat;
use crate::error::{Error, Result};
use pettalk_common::config::TomlConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Values supplied on the command line; `None` defers to the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub secret_key: Option<String>,
    pub user_token: Option<String>,
    pub max_attempts: Option<u32>,
    pub interval_ms: Option<u64>,
    pub mismatch_policy: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct EditorSettings {
    pub client: ClientConfig,
    pub poll: PollSettings,
    pub mismatch_policy: MismatchPolicy,
    pub upload_format: OutputFormat,
    pub data_dir: PathBuf,
}

impl EditorSettings {
    pub fn resolve(toml: &TomlConfig, overrides: &Overrides) -> Result<Self> {
        let analysis = &toml.analysis;

        let pick = |cli: &Option<String>, file: &Option<String>| {
            cli.clone().or_else(|| file.clone()).filter(|v| !v.trim().is_empty())
        };

        let client = ClientConfig {
            base_url: overrides
                .base_url
                .clone()
                .unwrap_or_else(|| analysis.base_url.clone()),
            upload_path: analysis.upload_path.clone(),
            result_path: analysis.result_path.clone(),
            client_id: pick(&overrides.client_id, &analysis.client_id),
            secret_key: pick(&overrides.secret_key, &analysis.secret_key),
            user_token: pick(&overrides.user_token, &analysis.user_token),
            referer: analysis.referer.clone(),
            request_timeout: Duration::from_millis(analysis.request_timeout_ms),
        };

        let max_attempts = overrides.max_attempts.unwrap_or(analysis.max_attempts);
        if max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".to_string()));
        }
        let poll = PollSettings {
            max_attempts,
            interval: Duration::from_millis(overrides.interval_ms.unwrap_or(analysis.interval_ms)),
        };

        let mismatch_policy: MismatchPolicy = overrides
            .mismatch_policy
            .as_deref()
            .unwrap_or(&analysis.mismatch_policy)
            .parse()?;

        let target_sample_rate = toml.extraction.target_sample_rate;
        if target_sample_rate == 0 {
            return Err(Error::Config("target_sample_rate must be positive".to_string()));
        }
        let upload_format = OutputFormat {
            preserve_channels: toml.extraction.preserve_channels,
            target_sample_rate: Some(target_sample_rate),
        };

        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| toml.storage.data_dir.clone())
            .unwrap_or_else(pettalk_common::config::default_data_dir);

        info!(
            "Analysis endpoint {} ({} attempts, {:?} interval, {:?} on mismatch)",
            client.base_url, poll.max_attempts, poll.interval, mismatch_policy
        );

        Ok(Self {
            client,
            poll,
            mismatch_policy,
            upload_format,
            data_dir,
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}
