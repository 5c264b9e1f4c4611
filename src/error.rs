//! Error types for the cache engine.
//!
//! Most outcomes in this crate are not errors: a [`Miss`](crate::CheckResult::Miss)
//! or [`Expired`](crate::CheckResult::Expired) result is a normal return value, and
//! removing an object that is not cached only logs a warning. Errors are reserved
//! for construction: invalid parameters and failed allocations.

use thiserror::Error;

/// Errors returned by the fallible constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A table or lock array could not be allocated.
    #[error("allocating {what} ({bytes} bytes) failed")]
    AllocFailed {
        /// Which structure was being allocated.
        what: &'static str,
        /// Requested size in bytes.
        bytes: usize,
    },

    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type CacheResult<T> = Result<T, CacheError>;

/// Logs an unrecoverable construction failure and terminates the process.
///
/// There is no degraded mode for a cache whose index could not be allocated.
#[cold]
pub(crate) fn fatal(err: CacheError) -> ! {
    tracing::error!(error = %err, "cannot continue without the object index");
    std::process::exit(1)
}
