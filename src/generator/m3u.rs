//! Extended M3U playlist rendering

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::models::Stream;

/// Group title for channels without categories
pub const UNDEFINED_GROUP: &str = "undefined";

pub struct M3uGenerator {
    output_file: PathBuf,
}

impl M3uGenerator {
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
        }
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// One `#EXTINF` entry plus URL line per stream, in the given order
    pub fn render(streams: &[Stream]) -> String {
        let mut m3u = String::from("#EXTM3U\n");

        for stream in streams {
            let (logo, group_title, name) = match &stream.channel_group {
                Some(group) => (
                    group.logo.as_str(),
                    group.primary_category().unwrap_or(UNDEFINED_GROUP),
                    group.name.as_str(),
                ),
                None => ("", UNDEFINED_GROUP, stream.channel.as_str()),
            };

            // Writing into a String cannot fail
            let _ = writeln!(
                m3u,
                "#EXTINF:-1 tvg-id=\"{}\" tvg-logo=\"{}\" group-title=\"{}\", {}",
                stream.channel, logo, group_title, name
            );
            m3u.push_str(&stream.url);
            m3u.push('\n');
        }

        m3u
    }

    /// Render and write the playlist, creating the parent directory if needed
    pub async fn save(&self, streams: &[Stream]) -> AppResult<usize> {
        let content = Self::render(streams);
        let playlist_error = |source| AppError::Playlist {
            path: self.output_file.clone(),
            source,
        };

        if let Some(parent) = self.output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(playlist_error)?;
        }
        tokio::fs::write(&self.output_file, content.as_bytes())
            .await
            .map_err(playlist_error)?;

        info!(
            "Playlist written file={} entries={} size={}KB",
            self.output_file.display(),
            streams.len(),
            content.len() / 1024
        );
        Ok(content.len())
    }
}
