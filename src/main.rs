use anyhow::{Context, Result};
use clap::Parser;
use clap::builder::BoolishValueParser;
use std::error::Error as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ipchrome::{
    config::{Config, defaults::DEFAULT_CONFIG_FILE},
    pipeline::PipelineOrchestrator,
};

#[derive(Parser)]
#[command(name = "ipchrome")]
#[command(version)]
#[command(about = "Builds a curated IPTV playlist from the iptv-org datasets")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Fetch the datasets or use existing ones (default: true)
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    fetch: Option<bool>,

    /// Merge streams and channels or reuse the merged file (default: true)
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    merge: Option<bool>,

    /// Filter and probe channels (default: true)
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    filter: Option<bool>,

    /// URL of the streams dataset
    #[arg(long, alias = "streams_url", value_name = "URL")]
    streams_url: Option<String>,

    /// URL of the channels dataset
    #[arg(long, alias = "channels_url", value_name = "URL")]
    channels_url: Option<String>,

    /// Directory for datasets and the playlist (default: ./var)
    #[arg(short, long, alias = "output_dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Probe timeout in seconds, 0 disables probing (default: 3)
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Maximum number of probes in flight (default: 32)
    #[arg(long, alias = "probe_concurrency", value_name = "N")]
    probe_concurrency: Option<usize>,

    /// Allowed languages
    #[arg(long, alias = "allowed_languages", num_args = 1.., value_name = "LANG")]
    allowed_languages: Option<Vec<String>>,

    /// Allowed broadcast areas
    #[arg(long, alias = "allowed_broadcast_areas", num_args = 1.., value_name = "AREA")]
    allowed_broadcast_areas: Option<Vec<String>>,

    /// Channel id endings that are always excluded
    #[arg(long, alias = "banned_endings", num_args = 1.., value_name = "SUFFIX")]
    banned_endings: Option<Vec<String>>,

    /// Channel id endings that are included regardless of language or area
    #[arg(long, alias = "forced_endings", num_args = 1.., value_name = "SUFFIX")]
    forced_endings: Option<Vec<String>>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// CLI flags take precedence over file and environment
    fn apply_overrides(self, config: &mut Config) {
        if let Some(fetch) = self.fetch {
            config.pipeline.fetch = fetch;
        }
        if let Some(merge) = self.merge {
            config.pipeline.merge = merge;
        }
        if let Some(filter) = self.filter {
            config.pipeline.filter = filter;
        }
        if let Some(url) = self.streams_url {
            config.sources.streams_url = url;
        }
        if let Some(url) = self.channels_url {
            config.sources.channels_url = url;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(timeout) = self.timeout {
            config.probe.timeout = Duration::from_secs(timeout);
        }
        if let Some(concurrency) = self.probe_concurrency {
            config.probe.concurrency = concurrency;
        }
        if self.allowed_languages.is_some() {
            config.filter.allowed_languages = self.allowed_languages;
        }
        if self.allowed_broadcast_areas.is_some() {
            config.filter.allowed_broadcast_areas = self.allowed_broadcast_areas;
        }
        if self.banned_endings.is_some() {
            config.filter.banned_endings = self.banned_endings;
        }
        if self.forced_endings.is_some() {
            config.filter.forced_endings = self.forced_endings;
        }
        config.verbose |= self.verbose;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let level = if cli.verbose && cli.log_level == "info" {
        "debug"
    } else {
        cli.log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ipchrome={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("====IPCHROME==== v{}", env!("CARGO_PKG_VERSION"));
    info!("Started at {}", chrono::Local::now().to_rfc3339());

    let config_file = cli.config.clone();
    let print_config = cli.print_config;
    let mut config = Config::load_from_file(&config_file)
        .with_context(|| format!("Failed to load configuration from {}", config_file.display()))?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    if config.verbose {
        debug!("Effective configuration: {:?}", config);
    }

    let verbose = config.verbose;
    let orchestrator = PipelineOrchestrator::new(config)?;
    match orchestrator.run().await {
        Ok(report) => {
            info!(
                "Playlist ready: {} ({} entries)",
                report.playlist_path.display(),
                report.playlist_entries
            );
            Ok(())
        }
        Err(e) => {
            error!("Error running pipeline, no playlist written. Exiting...");
            error!("Cause: {}", e);
            if verbose {
                let mut source = e.source();
                while let Some(cause) = source {
                    error!("  caused by: {}", cause);
                    source = cause.source();
                }
            }
            Err(e.into())
        }
    }
}
