//! The merge-filter-probe pipeline
//!
//! - [`merger`] joins the raw streams and channels datasets
//! - [`filter`] applies the inclusion policy
//! - [`prober`] drops streams whose URL does not answer in time
//! - [`orchestrator`] sequences the stages and writes the playlist

pub mod filter;
pub mod merger;
pub mod orchestrator;
pub mod prober;

pub use filter::{FilterPolicy, FilterStats, Rejection};
pub use merger::{MergeStats, Merger};
pub use orchestrator::{PipelineOrchestrator, PipelineReport};
pub use prober::{HttpReachabilityProbe, LivenessProber, ProbeStats, ReachabilityProbe};
