//! ipchrome builds a curated IPTV playlist from the iptv-org datasets.
//!
//! The streams and channels datasets are fetched, joined on channel id,
//! filtered by language, broadcast area and channel-id suffix, probed for
//! liveness, and written out as an extended M3U playlist.

pub mod config;
pub mod errors;
pub mod generator;
pub mod models;
pub mod pipeline;
pub mod repositories;
pub mod sources;
pub mod utils;
