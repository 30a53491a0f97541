//! Typed failure taxonomy for a sweep run.

use thiserror::Error;

/// All terminal failures a sweep can produce.
///
/// Every variant ends the run. The only local recovery anywhere is the
/// bounded navigation retry inside the collector; nothing is swallowed or
/// downgraded.
#[derive(Error, Debug)]
pub enum SweepError {
    /// The row container never appeared within the bound.
    #[error("timed out after {timeout_ms}ms waiting for listing rows")]
    ExtractionTimedOut { timeout_ms: u64 },

    /// Sustained zero-progress: the source stopped yielding new records.
    #[error("no new records; stalled with {collected} collected")]
    CollectionStalled { collected: usize },

    /// Every navigation attempt failed.
    #[error("navigation failed after {attempts} attempts: {last_error}")]
    NavigationFailed { attempts: u32, last_error: String },

    /// The collected sequence is not sorted newest to oldest.
    #[error("order violation at index {index}: \"{title}\"")]
    OrderViolation { index: usize, title: String },

    /// Any other extraction-boundary failure.
    #[error(transparent)]
    Extraction(#[from] anyhow::Error),
}
