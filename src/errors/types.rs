//! Error type definitions for ipchrome
//!
//! Every fatal failure of a run is one of the layered errors below, wrapped
//! into [`AppError`] at the orchestrator boundary. Probe failures are the
//! exception: they only decide whether a single stream survives and are never
//! surfaced as a run failure.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
///
/// Any value of this type aborts the run before a playlist is written.
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote dataset retrieval failed
    #[error("Dataset fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Persisted dataset could not be read, parsed or written
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Raw records could not be joined
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Playlist could not be written
    #[error("Playlist error: failed to write {path:?}: {source}")]
    Playlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised while downloading a source dataset
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, timeout)
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("HTTP error: {status} - {url}")]
    Status { url: String, status: u16 },

    /// Response body was not JSON
    #[error("Invalid JSON from {url}: {source}")]
    InvalidBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors raised by the dataset store
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Dataset file is missing
    #[error("Dataset not found: {path:?}")]
    NotFound { path: PathBuf },

    /// File system operation failed
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not the expected JSON shape
    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Dataset could not be serialized
    #[error("Serialization failed for {path:?}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the merger for malformed input records
#[derive(Error, Debug)]
pub enum MergeError {
    /// A record is missing a required key or has a key of the wrong type
    #[error("Malformed {dataset} record at index {index}: {source}")]
    MalformedRecord {
        dataset: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons a liveness probe classified a stream as dead
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Server answered with a non-success status
    #[error("Http Error: {status}")]
    Http { status: u16 },

    /// Connection could not be established or was reset
    #[error("Error Connecting: {message}")]
    Connection { message: String },

    /// No response within the probe timeout
    #[error("Timeout Error: no response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Anything else (invalid URL, protocol errors, ...)
    #[error("Error: {message}")]
    Other { message: String },
}

/// Dead-stream classification, used for summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProbeErrorKind {
    Http,
    Connection,
    Timeout,
    Other,
}

impl ProbeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http-error",
            Self::Connection => "connection-error",
            Self::Timeout => "timeout",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl ProbeError {
    pub fn kind(&self) -> ProbeErrorKind {
        match self {
            Self::Http { .. } => ProbeErrorKind::Http,
            Self::Connection { .. } => ProbeErrorKind::Connection,
            Self::Timeout { .. } => ProbeErrorKind::Timeout,
            Self::Other { .. } => ProbeErrorKind::Other,
        }
    }

    /// Classify a reqwest failure
    ///
    /// Status errors are checked before timeouts so a slow 5xx still counts
    /// as an HTTP error.
    pub fn from_reqwest(error: &reqwest::Error, timeout: std::time::Duration) -> Self {
        if let Some(status) = error.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else if error.is_timeout() {
            Self::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if error.is_connect() {
            Self::Connection {
                message: error.to_string(),
            }
        } else {
            Self::Other {
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_kind_mapping() {
        assert_eq!(ProbeError::Http { status: 404 }.kind(), ProbeErrorKind::Http);
        assert_eq!(
            ProbeError::Connection {
                message: "refused".into()
            }
            .kind(),
            ProbeErrorKind::Connection
        );
        assert_eq!(
            ProbeError::Timeout { timeout_ms: 3000 }.kind(),
            ProbeErrorKind::Timeout
        );
        assert_eq!(
            ProbeError::Other {
                message: "bad url".into()
            }
            .kind(),
            ProbeErrorKind::Other
        );
    }

    #[test]
    fn test_probe_error_kind_labels() {
        assert_eq!(ProbeErrorKind::Http.to_string(), "http-error");
        assert_eq!(ProbeErrorKind::Connection.to_string(), "connection-error");
        assert_eq!(ProbeErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(ProbeErrorKind::Other.to_string(), "other");
    }

    #[test]
    fn test_merge_error_names_dataset_and_index() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = MergeError::MalformedRecord {
            dataset: "channels",
            index: 7,
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("channels"));
        assert!(msg.contains("index 7"));
    }
}
