//! Error taxonomy shared by every stage of source construction.

use thiserror::Error;

/// Errors raised while building or querying fault sources.
///
/// Numeric tolerance problems are not errors; they are attached to
/// [`crate::mfd::MfdDiagnostics`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuakeError {
    /// Invalid parameter combination detected at rebuild time.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Operation that the selected strategy cannot honor.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// Index into a segment, source or rupture list out of range.
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    /// Site query farther from the fault trace than the site cutoff.
    #[error("location is {distance:.3} km from the fault trace (limit {limit} km)")]
    OffFault { distance: f64, limit: f64 },
}

impl QuakeError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        QuakeError::Configuration(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QuakeError>;
