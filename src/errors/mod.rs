//! Centralized error handling for ipchrome
//!
//! # Error Categories
//!
//! - **Fetch Errors**: downloading the stream/channel datasets
//! - **Dataset Errors**: reading, parsing and writing persisted JSON files
//! - **Merge Errors**: malformed raw records handed to the merger
//! - **Probe Errors**: per-stream liveness failures, never fatal to a run
//!
//! # Usage
//!
//! ```rust
//! use ipchrome::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("output_dir must not be empty"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for dataset store Results
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Convenience type alias for fetch Results
pub type FetchResult<T> = Result<T, FetchError>;
