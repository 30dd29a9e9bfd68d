//! Domain models for the merged IPTV dataset.

use serde::{Deserialize, Serialize};

/// Channel metadata from the channels dataset
///
/// `broadcast_area` and `languages` keep their dataset order so the merged
/// file round-trips verbatim; membership checks treat them as sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub id: String,
    pub name: String,
    pub country: String,
    pub broadcast_area: Vec<String>,
    pub languages: Vec<String>,
    /// Ordered category labels, the first one is the primary category
    pub categories: Vec<String>,
    pub is_nsfw: bool,
    pub logo: String,
}

impl ChannelGroup {
    /// Primary category, used as the playlist group title
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    pub fn speaks_any<'a, I>(&self, languages: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        intersects(&self.languages, languages)
    }

    pub fn broadcasts_in_any<'a, I>(&self, areas: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        intersects(&self.broadcast_area, areas)
    }
}

fn intersects<'a, I>(own: &[String], other: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    other.into_iter().any(|candidate| own.contains(candidate))
}

/// Stream record as it appears in the streams dataset
///
/// Only the join key and URL are kept; every other field is ignored. A null
/// `channel` is read as empty and never joins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawStream {
    #[serde(deserialize_with = "null_as_empty")]
    pub channel: String,
    pub url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A playable URL joined with the metadata of its channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub channel: String,
    pub url: String,
    pub channel_group: Option<ChannelGroup>,
}

impl Stream {
    pub fn new(channel: impl Into<String>, url: impl Into<String>, channel_group: ChannelGroup) -> Self {
        Self {
            channel: channel.into(),
            url: url.into(),
            channel_group: Some(channel_group),
        }
    }

    pub fn channel_ends_with_any<'a, I>(&self, suffixes: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        suffixes
            .into_iter()
            .any(|suffix| self.channel.ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn channel_group(id: &str, languages: &[&str], areas: &[&str]) -> ChannelGroup {
        ChannelGroup {
            id: id.to_string(),
            name: format!("{id} TV"),
            country: "UK".to_string(),
            broadcast_area: areas.iter().map(|s| s.to_string()).collect(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            categories: vec!["general".to_string()],
            is_nsfw: false,
            logo: format!("https://logos.example/{id}.png"),
        }
    }

    pub fn stream(channel: &str, languages: &[&str], areas: &[&str]) -> Stream {
        Stream::new(
            channel,
            format!("http://streams.example/{channel}.m3u8"),
            channel_group(channel, languages, areas),
        )
    }
}
