//! Error type for host-boundary failures.
//!
//! The core algorithms never fail: unknown roots yield empty results, bad
//! links are dropped at ingestion and unplaceable nodes get fallback
//! positions. Errors only arise where the host hands us malformed input.

use thiserror::Error;

/// Failures surfaced to the host.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrgGraphError {
    /// A value coming from the host could not be decoded.
    #[error("invalid {what}: {message}")]
    InvalidInput { what: &'static str, message: String },

    /// The host named a node id that is not part of the loaded dataset.
    #[error("unknown node id `{0}`")]
    UnknownNode(String),

    /// A style or layout parameter is negative or not finite.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl OrgGraphError {
    pub(crate) fn invalid_input(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            what,
            message: err.to_string(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OrgGraphError>;

/// Reject negative or non-finite parameters.
pub(crate) fn ensure_non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(OrgGraphError::InvalidConfig(format!(
            "`{name}` must be a finite, non-negative number (got {value})"
        )))
    }
}
