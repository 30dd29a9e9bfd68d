//! Concurrent liveness probing of stream URLs
//!
//! Each accepted stream gets one streaming GET. Probes run with at most
//! `concurrency` in flight, each under its own timeout, and a stream survives
//! only if its probe answered with a success status in time. Survivors keep
//! their input order regardless of completion order.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{KeepaliveConfig, ProbeConfig};
use crate::errors::{ProbeError, ProbeErrorKind};
use crate::models::Stream;
use crate::utils::{UrlUtils, format_elapsed};

/// A single reachability check
///
/// Implementations must release any connection they open before returning.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), ProbeError>;
}

/// Streaming GET probe; the body is never read
pub struct HttpReachabilityProbe {
    client: Client,
    timeout: Duration,
}

impl HttpReachabilityProbe {
    /// Build the probing client
    ///
    /// `keepalive` tunes TCP keep-alive on this client only. Passing `None`
    /// (or a disabled config) leaves the OS defaults in place.
    pub fn new(timeout: Duration, keepalive: Option<&KeepaliveConfig>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            // Probed connections are never reused
            .pool_max_idle_per_host(0)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ));

        if let Some(keepalive) = keepalive.filter(|k| k.enabled) {
            builder = builder
                .tcp_keepalive(keepalive.idle)
                .tcp_keepalive_interval(keepalive.interval)
                .tcp_keepalive_retries(keepalive.retries);
        }

        Ok(Self {
            client: builder.build()?,
            timeout,
        })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(&e, self.timeout))?;

        let status = response.status();
        // Dropping the unread response closes the connection
        drop(response);

        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Http {
                status: status.as_u16(),
            })
        }
    }
}

/// Outcome counters for one probing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Probing was disabled and the input passed through
    pub skipped: bool,
    pub probed: usize,
    pub alive: usize,
    pub dead: BTreeMap<ProbeErrorKind, usize>,
}

impl ProbeStats {
    pub fn dead_total(&self) -> usize {
        self.dead.values().sum()
    }
}

pub struct LivenessProber {
    probe: Arc<dyn ReachabilityProbe>,
    timeout: Option<Duration>,
    concurrency: usize,
    verbose: bool,
}

impl LivenessProber {
    pub fn new(
        probe: Arc<dyn ReachabilityProbe>,
        timeout: Option<Duration>,
        concurrency: usize,
        verbose: bool,
    ) -> Self {
        Self {
            probe,
            timeout: timeout.filter(|t| !t.is_zero()),
            concurrency: concurrency.max(1),
            verbose,
        }
    }

    /// HTTP prober built from configuration
    pub fn from_config(config: &ProbeConfig, verbose: bool) -> Result<Self, reqwest::Error> {
        let timeout = config.effective_timeout();
        let probe = HttpReachabilityProbe::new(
            timeout.unwrap_or(config.timeout),
            Some(&config.keepalive),
        )?;
        Ok(Self::new(Arc::new(probe), timeout, config.concurrency, verbose))
    }

    pub fn is_enabled(&self) -> bool {
        self.timeout.is_some()
    }

    /// Keep the streams whose URL is reachable, in input order
    ///
    /// With probing disabled the input is returned unchanged.
    pub async fn retain_alive(&self, streams: Vec<Stream>) -> (Vec<Stream>, ProbeStats) {
        let Some(timeout) = self.timeout else {
            debug!("Liveness probing disabled, keeping {} streams", streams.len());
            return (
                streams,
                ProbeStats {
                    skipped: true,
                    ..Default::default()
                },
            );
        };

        let start = Instant::now();
        info!(
            "Probing {} streams timeout={} concurrency={}",
            streams.len(),
            format_elapsed(timeout),
            self.concurrency
        );

        let outcomes: Vec<(usize, Result<(), ProbeError>)> = stream::iter(streams.iter().enumerate())
            .map(|(index, candidate)| async move {
                let outcome = self.probe_with_timeout(&candidate.url, timeout).await;
                self.report(&candidate.url, &outcome);
                (index, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut stats = ProbeStats {
            probed: streams.len(),
            ..Default::default()
        };
        let mut alive = vec![false; streams.len()];
        for (index, outcome) in outcomes {
            match outcome {
                Ok(()) => alive[index] = true,
                Err(e) => *stats.dead.entry(e.kind()).or_insert(0) += 1,
            }
        }

        let survivors: Vec<Stream> = streams
            .into_iter()
            .zip(alive)
            .filter_map(|(stream, is_alive)| is_alive.then_some(stream))
            .collect();
        stats.alive = survivors.len();

        info!(
            "Probing done in {} probed={} alive={} dead={}",
            format_elapsed(start.elapsed()),
            stats.probed,
            stats.alive,
            stats.dead_total()
        );
        for (kind, count) in &stats.dead {
            debug!("  dead kind={} count={}", kind, count);
        }

        (survivors, stats)
    }

    /// The timer starts when the probe is first polled; on expiry the probe
    /// future is dropped, which releases its connection
    async fn probe_with_timeout(&self, url: &str, timeout: Duration) -> Result<(), ProbeError> {
        match tokio::time::timeout(timeout, self.probe.probe(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn report(&self, url: &str, outcome: &Result<(), ProbeError>) {
        let url = UrlUtils::obfuscate_credentials(url);
        match outcome {
            Ok(()) if self.verbose => info!("Stream {} is alive.", url),
            Ok(()) => debug!("Stream {} is alive.", url),
            Err(e) if self.verbose => info!("Stream {} is dead. kind={} {}", url, e.kind(), e),
            Err(e) => debug!("Stream {} is dead. kind={} {}", url, e.kind(), e),
        }
    }
}
