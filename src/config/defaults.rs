/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Source defaults
pub const DEFAULT_STREAMS_URL: &str = "https://iptv-org.github.io/api/streams.json";
pub const DEFAULT_CHANNELS_URL: &str = "https://iptv-org.github.io/api/channels.json";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

// Storage defaults
pub const DEFAULT_OUTPUT_DIR: &str = "./var";
pub const STREAMS_FILE: &str = "streams.json";
pub const CHANNELS_FILE: &str = "channels.json";
pub const MERGED_FILE: &str = "merged.json";
pub const PLAYLIST_FILE: &str = "output.m3u";

// Pipeline defaults
pub const DEFAULT_FETCH: bool = true;
pub const DEFAULT_MERGE: bool = true;
pub const DEFAULT_FILTER: bool = true;

// Probe defaults
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_PROBE_CONCURRENCY: usize = 32;
pub const DEFAULT_KEEPALIVE_ENABLED: bool = true;
pub const DEFAULT_KEEPALIVE_IDLE_SECS: u64 = 1;
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_KEEPALIVE_RETRIES: u32 = 5;

// Config file defaults
pub const DEFAULT_CONFIG_FILE: &str = "ipchrome.toml";
pub const ENV_PREFIX: &str = "IPCHROME_";
