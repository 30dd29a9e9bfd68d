//! File-backed store for the raw and merged datasets
//!
//! Layout under the output directory:
//!
//! - `streams.json`  raw stream records, as fetched
//! - `channels.json` raw channel records, as fetched
//! - `merged.json`   joined [`Stream`] records

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::defaults::{CHANNELS_FILE, MERGED_FILE, STREAMS_FILE};
use crate::errors::{DatasetError, DatasetResult};
use crate::models::Stream;

/// The two upstream datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Streams,
    Channels,
}

impl DatasetKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Streams => STREAMS_FILE,
            Self::Channels => CHANNELS_FILE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Streams => "streams",
            Self::Channels => "channels",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetRepository {
    base_dir: PathBuf,
}

impl DatasetRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn raw_path(&self, kind: DatasetKind) -> PathBuf {
        self.base_dir.join(kind.file_name())
    }

    pub fn merged_path(&self) -> PathBuf {
        self.base_dir.join(MERGED_FILE)
    }

    /// Persist a raw dataset exactly as received
    pub async fn save_raw(
        &self,
        kind: DatasetKind,
        records: &[serde_json::Value],
    ) -> DatasetResult<PathBuf> {
        let path = self.raw_path(kind);
        self.write_json(&path, records).await?;
        debug!(
            "Saved {} {} records to {}",
            records.len(),
            kind.label(),
            path.display()
        );
        Ok(path)
    }

    /// Load a raw dataset as untyped records
    ///
    /// Record shape is checked by the merger, here only the top-level array is.
    pub async fn load_raw(&self, kind: DatasetKind) -> DatasetResult<Vec<serde_json::Value>> {
        self.read_json(&self.raw_path(kind)).await
    }

    pub async fn save_merged(&self, streams: &[Stream]) -> DatasetResult<PathBuf> {
        let path = self.merged_path();
        self.write_json(&path, streams).await?;
        debug!("Saved {} merged streams to {}", streams.len(), path.display());
        Ok(path)
    }

    pub async fn load_merged(&self) -> DatasetResult<Vec<Stream>> {
        self.read_json(&self.merged_path()).await
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> DatasetResult<T> {
        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DatasetError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(DatasetError::io(path, e)),
        };

        serde_json::from_slice(&contents).map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write pretty JSON through a temp file so a failed run never leaves a
    /// truncated dataset behind
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> DatasetResult<()> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| DatasetError::io(&self.base_dir, e))?;

        let bytes =
            serde_json::to_vec_pretty(value).map_err(|source| DatasetError::Serialization {
                path: path.to_path_buf(),
                source,
            })?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| DatasetError::io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| DatasetError::io(path, e))?;
        Ok(())
    }
}
