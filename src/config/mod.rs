use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::errors::{AppError, AppResult};

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for the persisted datasets and the playlist
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Per-probe diagnostics and full error chains
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_streams_url")]
    pub streams_url: String,
    #[serde(default = "default_channels_url")]
    pub channels_url: String,
    #[serde(default = "default_fetch_timeout", with = "duration_serde::duration")]
    pub fetch_timeout: Duration,
}

/// Which stages run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Refresh the raw datasets before processing
    #[serde(default = "default_fetch")]
    pub fetch: bool,
    /// Rebuild the merged set instead of reusing the persisted one
    #[serde(default = "default_merge")]
    pub merge: bool,
    /// Run the filter policy and the liveness prober
    #[serde(default = "default_filter")]
    pub filter: bool,
}

/// Inclusion rules; `None` means unset, which is not the same as "match all"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_broadcast_areas: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_endings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_endings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-probe timeout, zero disables probing
    #[serde(default = "default_probe_timeout", with = "duration_serde::duration")]
    pub timeout: Duration,
    /// Maximum number of probes in flight
    #[serde(default = "default_probe_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
}

/// TCP keep-alive tuning for the probing client
///
/// Only affects how fast stalled connections are noticed, never whether a
/// stream is classified alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    #[serde(default = "default_keepalive_enabled")]
    pub enabled: bool,
    #[serde(default = "default_keepalive_idle", with = "duration_serde::duration")]
    pub idle: Duration,
    #[serde(default = "default_keepalive_interval", with = "duration_serde::duration")]
    pub interval: Duration,
    #[serde(default = "default_keepalive_retries")]
    pub retries: u32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_streams_url() -> String {
    DEFAULT_STREAMS_URL.to_string()
}

fn default_channels_url() -> String {
    DEFAULT_CHANNELS_URL.to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)
}

fn default_fetch() -> bool {
    DEFAULT_FETCH
}

fn default_merge() -> bool {
    DEFAULT_MERGE
}

fn default_filter() -> bool {
    DEFAULT_FILTER
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)
}

fn default_probe_concurrency() -> usize {
    DEFAULT_PROBE_CONCURRENCY
}

fn default_keepalive_enabled() -> bool {
    DEFAULT_KEEPALIVE_ENABLED
}

fn default_keepalive_idle() -> Duration {
    Duration::from_secs(DEFAULT_KEEPALIVE_IDLE_SECS)
}

fn default_keepalive_interval() -> Duration {
    Duration::from_secs(DEFAULT_KEEPALIVE_INTERVAL_SECS)
}

fn default_keepalive_retries() -> u32 {
    DEFAULT_KEEPALIVE_RETRIES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
            sources: SourcesConfig::default(),
            pipeline: PipelineConfig::default(),
            filter: FilterConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            streams_url: default_streams_url(),
            channels_url: default_channels_url(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch: default_fetch(),
            merge: default_merge(),
            filter: default_filter(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: default_probe_timeout(),
            concurrency: default_probe_concurrency(),
            keepalive: KeepaliveConfig::default(),
        }
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: default_keepalive_enabled(),
            idle: default_keepalive_idle(),
            interval: default_keepalive_interval(),
            retries: default_keepalive_retries(),
        }
    }
}

impl ProbeConfig {
    /// `None` when probing is disabled
    pub fn effective_timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }
}

impl Config {
    /// Layer defaults, the optional TOML file and `IPCHROME_*` env vars
    ///
    /// A missing file is not an error. Nested keys use `__` in env var names,
    /// e.g. `IPCHROME_PROBE__TIMEOUT=5`.
    pub fn load_from_file(config_file: impl AsRef<Path>) -> AppResult<Self> {
        let config_file = config_file.as_ref();
        if config_file.exists() {
            info!("Loading configuration from {}", config_file.display());
        } else {
            debug!(
                "Config file {} not found, using defaults and environment",
                config_file.display()
            );
        }

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AppError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(AppError::configuration("output_dir must not be empty"));
        }
        if self.probe.concurrency == 0 {
            return Err(AppError::configuration(
                "probe.concurrency must be at least 1",
            ));
        }
        for (field, value) in [
            ("sources.streams_url", &self.sources.streams_url),
            ("sources.channels_url", &self.sources.channels_url),
        ] {
            Url::parse(value).map_err(|e| {
                AppError::configuration(format!("{field} is not a valid URL ({value}): {e}"))
            })?;
        }
        Ok(())
    }

    /// Effective configuration as a TOML document, usable as a config file
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::configuration(format!("failed to serialize config: {e}")))
    }

    pub fn streams_path(&self) -> PathBuf {
        self.output_dir.join(STREAMS_FILE)
    }

    pub fn channels_path(&self) -> PathBuf {
        self.output_dir.join(CHANNELS_FILE)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join(MERGED_FILE)
    }

    pub fn playlist_path(&self) -> PathBuf {
        self.output_dir.join(PLAYLIST_FILE)
    }
}
