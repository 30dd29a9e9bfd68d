//! Persistence for the raw and merged datasets
//!
//! There is no database: every dataset is a pretty-printed JSON array under
//! the configured output directory, read back whole.

pub mod dataset;

pub use dataset::{DatasetKind, DatasetRepository};
