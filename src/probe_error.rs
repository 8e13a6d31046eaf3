//! ProbeError: unified error type for rank-probe public APIs
//!
//! Every failure along join -> query -> report -> leave surfaces as one of
//! these variants; the binary maps all of them to exit status 1.

use thiserror::Error;

/// Unified error type for rank-probe operations.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Joining the parallel runtime failed (not installed, or already initialised).
    #[error("parallel runtime unavailable: {0}")]
    RuntimeUnavailable(String),
    /// The requested backend was not compiled into this build.
    #[error("backend `{0}` is not available in this build")]
    BackendUnavailable(&'static str),
    /// The runtime reported a rank outside `[0, size)` or an empty group.
    #[error("inconsistent group membership: rank {rank} of size {size}")]
    InvalidRank { rank: usize, size: usize },
    /// Querying the processor name failed.
    #[error("processor name query failed: {0}")]
    ProcessorName(String),
    /// Rejected command line or configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Writing the report failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Rendering the JSON report failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A thread standing in for a rank in the local launcher panicked.
    #[error("local rank {0} panicked")]
    LocalRankPanicked(usize),
}
