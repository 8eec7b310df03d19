//! Error types for matchgrid.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias for matchgrid operations.
pub type MatchGridResult<T> = std::result::Result<T, MatchGridError>;

/// Errors that can occur while orchestrating matchers or compositing grids.
///
/// Invocation-level failures carry whatever output the matcher produced
/// before failing, so callers can surface it for diagnosis. Recoverable
/// conditions (unparsable output lines, unresolvable match paths, unreadable
/// match tiles) are not errors; they are logged and shrink the result set.
#[derive(Debug, Error)]
pub enum MatchGridError {
    /// The method identifier has no registered matcher mapping.
    #[error("unknown matcher method: {0}")]
    UnknownMethod(String),
    /// The method requires a precomputed feature index, but none was configured.
    #[error("method {method} requires a feature index path")]
    MissingFeatureIndex { method: String },
    /// The matcher executable does not exist at the resolved path.
    #[error("matcher executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },
    /// The matcher ran to completion but reported failure.
    #[error("matcher exited with status {status}")]
    MatcherNonZeroExit {
        status: i32,
        stdout: String,
        stderr: String,
    },
    /// The matcher exceeded the invocation deadline and was killed.
    #[error("matcher did not finish within {timeout:?}")]
    MatcherTimeout {
        timeout: Duration,
        stdout: String,
        stderr: String,
    },
    /// The target image is missing or cannot be decoded. The target anchors
    /// every row, so this aborts the whole search or composition.
    #[error("cannot read target image {path}: {reason}")]
    TargetImageUnreadable { path: PathBuf, reason: String },
    /// The requested result limit is zero.
    #[error("result limit must be at least 1")]
    InvalidLimit,
    /// The assembled raster could not be encoded or written.
    #[error("failed to write composite to {path}: {reason}")]
    ImageEncode { path: PathBuf, reason: String },
    /// An I/O failure outside the cases above (pipe setup, wait, ...).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
