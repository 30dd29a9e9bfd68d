//! Utility modules shared across the pipeline stages

pub mod human_format;
pub mod url;

pub use human_format::{format_duration, format_elapsed};
pub use url::UrlUtils;
