//! Single-attempt download of the upstream datasets
//!
//! Both datasets are JSON arrays served over HTTP. A fetch either persists the
//! whole array or fails; there are no retries.

use reqwest::Client;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SourcesConfig;
use crate::errors::{FetchError, FetchResult};
use crate::repositories::{DatasetKind, DatasetRepository};
use crate::utils::{UrlUtils, format_elapsed};

pub struct DatasetFetcher {
    client: Client,
    streams_url: String,
    channels_url: String,
}

impl DatasetFetcher {
    pub fn new(config: &SourcesConfig) -> FetchResult<Self> {
        Self::with_timeout(
            config.streams_url.clone(),
            config.channels_url.clone(),
            config.fetch_timeout,
        )
    }

    pub fn with_timeout(
        streams_url: String,
        channels_url: String,
        timeout: Duration,
    ) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            streams_url,
            channels_url,
        })
    }

    /// Fetch channels then streams, persisting each as soon as it arrives
    pub async fn fetch_all(&self, repository: &DatasetRepository) -> crate::errors::AppResult<()> {
        self.fetch_into(DatasetKind::Channels, repository).await?;
        self.fetch_into(DatasetKind::Streams, repository).await?;
        Ok(())
    }

    pub async fn fetch_into(
        &self,
        kind: DatasetKind,
        repository: &DatasetRepository,
    ) -> crate::errors::AppResult<PathBuf> {
        let records = self.fetch(kind).await?;
        let path = repository.save_raw(kind, &records).await?;
        Ok(path)
    }

    /// Download one dataset as untyped records
    pub async fn fetch(&self, kind: DatasetKind) -> FetchResult<Vec<serde_json::Value>> {
        let url = self.url_for(kind);
        let display_url = UrlUtils::obfuscate_credentials(url);
        let start = Instant::now();
        info!("Fetching {} dataset from {}", kind.label(), display_url);
        debug!(
            "Dataset host: {}",
            UrlUtils::extract_domain(url).unwrap_or_else(|| "unknown".to_string())
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: display_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: display_url,
                status: status.as_u16(),
            });
        }

        let records: Vec<serde_json::Value> =
            response
                .json()
                .await
                .map_err(|source| FetchError::InvalidBody {
                    url: display_url.clone(),
                    source,
                })?;

        info!(
            "Fetched {} {} records in {}",
            records.len(),
            kind.label(),
            format_elapsed(start.elapsed())
        );
        Ok(records)
    }

    fn url_for(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Streams => &self.streams_url,
            DatasetKind::Channels => &self.channels_url,
        }
    }
}
