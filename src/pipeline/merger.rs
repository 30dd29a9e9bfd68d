//! Inner join of the streams dataset with the channels dataset
//!
//! A stream joins every channel whose `id` equals the stream's `channel`.
//! Duplicate channel ids fan out into one [`Stream`] per matching channel, and
//! output order is stream-major with channels in dataset order, exactly what a
//! nested loop over streams then channels would produce.

use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::errors::MergeError;
use crate::models::{ChannelGroup, RawStream, Stream};
use crate::utils::format_elapsed;

/// Counters from one merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub input_streams: usize,
    pub input_channels: usize,
    pub merged: usize,
    pub unmatched_streams: usize,
    pub duplicate_channel_ids: usize,
}

#[derive(Debug, Default)]
pub struct Merger;

impl Merger {
    pub fn new() -> Self {
        Self
    }

    /// Join raw records, failing on the first malformed one
    pub fn merge(
        &self,
        raw_streams: &[serde_json::Value],
        raw_channels: &[serde_json::Value],
    ) -> Result<(Vec<Stream>, MergeStats), MergeError> {
        let start = Instant::now();
        let streams: Vec<RawStream> = parse_records("streams", raw_streams)?;
        let channels: Vec<ChannelGroup> = parse_records("channels", raw_channels)?;

        let (merged, stats) = self.join(&streams, &channels);

        info!(
            "Merging done in {} streams={} channels={} merged={} unmatched={}",
            format_elapsed(start.elapsed()),
            stats.input_streams,
            stats.input_channels,
            stats.merged,
            stats.unmatched_streams
        );
        Ok((merged, stats))
    }

    /// Join already-typed records
    pub fn join(&self, streams: &[RawStream], channels: &[ChannelGroup]) -> (Vec<Stream>, MergeStats) {
        let mut by_id: HashMap<&str, Vec<&ChannelGroup>> = HashMap::with_capacity(channels.len());
        for channel in channels {
            by_id.entry(channel.id.as_str()).or_default().push(channel);
        }

        let duplicate_channel_ids = by_id.values().filter(|groups| groups.len() > 1).count();
        if duplicate_channel_ids > 0 {
            debug!(
                "{} channel ids appear more than once, matching streams will be duplicated",
                duplicate_channel_ids
            );
        }

        let mut merged = Vec::with_capacity(streams.len());
        let mut unmatched_streams = 0;
        for stream in streams {
            match by_id.get(stream.channel.as_str()) {
                Some(groups) if !stream.channel.is_empty() => {
                    merged.extend(
                        groups
                            .iter()
                            .map(|group| Stream::new(&stream.channel, &stream.url, (*group).clone())),
                    );
                }
                _ => unmatched_streams += 1,
            }
        }

        let stats = MergeStats {
            input_streams: streams.len(),
            input_channels: channels.len(),
            merged: merged.len(),
            unmatched_streams,
            duplicate_channel_ids,
        };
        (merged, stats)
    }
}

fn parse_records<T: serde::de::DeserializeOwned>(
    dataset: &'static str,
    records: &[serde_json::Value],
) -> Result<Vec<T>, MergeError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record.clone()).map_err(|source| MergeError::MalformedRecord {
                dataset,
                index,
                source,
            })
        })
        .collect()
}
