//! Runs the stages of one playlist build in order
//!
//! fetch → merge (or reuse) → filter → probe → write playlist
//!
//! Any fetch, dataset or merge error stops the run before the playlist is
//! written. Probe failures only drop the affected stream.

use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::generator::M3uGenerator;
use crate::models::Stream;
use crate::pipeline::filter::{FilterPolicy, FilterStats};
use crate::pipeline::merger::{MergeStats, Merger};
use crate::pipeline::prober::{LivenessProber, ProbeStats};
use crate::repositories::{DatasetKind, DatasetRepository};
use crate::sources::DatasetFetcher;
use crate::utils::format_elapsed;

/// Summary of a completed run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub fetched: bool,
    pub merge: Option<MergeStats>,
    pub merged_streams: usize,
    pub filter: Option<FilterStats>,
    pub probe: Option<ProbeStats>,
    pub playlist_entries: usize,
    pub playlist_path: PathBuf,
}

pub struct PipelineOrchestrator {
    config: Config,
    repository: DatasetRepository,
    prober: Option<LivenessProber>,
}

impl PipelineOrchestrator {
    pub fn new(config: Config) -> AppResult<Self> {
        let prober = if config.pipeline.filter {
            Some(
                LivenessProber::from_config(&config.probe, config.verbose).map_err(|e| {
                    AppError::configuration(format!("failed to build probe client: {e}"))
                })?,
            )
        } else {
            None
        };
        Ok(Self::with_prober(config, prober))
    }

    /// Use a caller-supplied prober instead of the HTTP one
    pub fn with_prober(config: Config, prober: Option<LivenessProber>) -> Self {
        let repository = DatasetRepository::new(&config.output_dir);
        Self {
            config,
            repository,
            prober,
        }
    }

    pub fn repository(&self) -> &DatasetRepository {
        &self.repository
    }

    pub async fn run(&self) -> AppResult<PipelineReport> {
        let start = Instant::now();
        let mut report = PipelineReport {
            playlist_path: self.config.playlist_path(),
            ..Default::default()
        };

        if self.config.pipeline.fetch {
            info!("Fetching data...");
            let fetcher = DatasetFetcher::new(&self.config.sources)?;
            fetcher.fetch_all(&self.repository).await?;
            report.fetched = true;
        }

        let (merged, merge_stats) = self.merged_streams().await?;
        report.merge = merge_stats;
        report.merged_streams = merged.len();

        let streams = if self.config.pipeline.filter {
            info!("Filtering data...");
            let (accepted, filter_stats) =
                FilterPolicy::from_config(&self.config.filter).apply(&merged);
            report.filter = Some(filter_stats);

            match &self.prober {
                Some(prober) => {
                    let (alive, probe_stats) = prober.retain_alive(accepted).await;
                    report.probe = Some(probe_stats);
                    alive
                }
                None => accepted,
            }
        } else {
            merged
        };

        info!("Transforming to m3u...");
        M3uGenerator::new(&report.playlist_path)
            .save(&streams)
            .await?;
        report.playlist_entries = streams.len();

        info!(
            "Pipeline completed in {} merged={} playlist_entries={}",
            format_elapsed(start.elapsed()),
            report.merged_streams,
            report.playlist_entries
        );
        Ok(report)
    }

    /// Rebuild and persist the merged set, or reuse the persisted one
    ///
    /// Either way the result is read back from storage.
    async fn merged_streams(&self) -> AppResult<(Vec<Stream>, Option<MergeStats>)> {
        let stats = if self.config.pipeline.merge {
            info!("Merging streams and channels data...");
            let raw_streams = self.repository.load_raw(DatasetKind::Streams).await?;
            let raw_channels = self.repository.load_raw(DatasetKind::Channels).await?;
            let (merged, stats) = Merger::new().merge(&raw_streams, &raw_channels)?;
            self.repository.save_merged(&merged).await?;
            Some(stats)
        } else {
            info!(
                "Reusing merged data from {}",
                self.repository.merged_path().display()
            );
            None
        };

        let merged = self.repository.load_merged().await?;
        Ok((merged, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.output_dir = dir.to_path_buf();
        config.pipeline.fetch = false;
        config.probe.timeout = std::time::Duration::ZERO;
        config.filter.allowed_languages = Some(vec!["eng".to_string()]);
        config
    }

    async fn seed(repo: &DatasetRepository) {
        let channels = vec![json!({
            "id": "c1", "name": "One", "country": "UK", "broadcast_area": ["c/UK"],
            "languages": ["eng"], "categories": ["News"], "is_nsfw": false, "logo": "l1"
        })];
        let streams = vec![json!({"channel": "c1", "url": "http://ok"})];
        repo.save_raw(DatasetKind::Channels, &channels).await.unwrap();
        repo.save_raw(DatasetKind::Streams, &streams).await.unwrap();
    }

    #[tokio::test]
    async fn test_merge_persists_then_reuse_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let orchestrator = PipelineOrchestrator::new(config.clone()).unwrap();
        seed(orchestrator.repository()).await;

        let first = orchestrator.run().await.unwrap();
        assert!(first.merge.is_some());
        assert_eq!(first.playlist_entries, 1);
        assert!(config.merged_path().exists());

        // Raw datasets are gone, so the second run can only use merged.json
        tokio::fs::remove_file(config.streams_path()).await.unwrap();
        let mut reuse = config.clone();
        reuse.pipeline.merge = false;
        let second = PipelineOrchestrator::new(reuse).unwrap().run().await.unwrap();
        assert!(second.merge.is_none());
        assert_eq!(second.playlist_entries, 1);
    }

    #[tokio::test]
    async fn test_filter_disabled_passes_merged_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.pipeline.filter = false;
        config.filter.allowed_languages = None;
        let orchestrator = PipelineOrchestrator::new(config).unwrap();
        seed(orchestrator.repository()).await;

        let report = orchestrator.run().await.unwrap();
        assert!(report.filter.is_none());
        assert!(report.probe.is_none());
        assert_eq!(report.playlist_entries, 1);
    }

    #[tokio::test]
    async fn test_missing_raw_dataset_aborts_without_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let orchestrator = PipelineOrchestrator::new(config.clone()).unwrap();

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, AppError::Dataset(_)));
        assert!(!config.playlist_path().exists());
    }
}
