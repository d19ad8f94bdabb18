// File: silcrow-router/src/error.rs
// Purpose: Error type for route compilation, lookup and URL generation

use thiserror::Error;

/// Errors produced by the route table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A route was added, or the table built, after `build()` already ran
    #[error("route table is already built, no routes may be added")]
    AlreadyBuilt,

    /// `lookup()` was called before `build()`
    #[error("route table has not been built yet")]
    NotBuilt,

    /// The pattern could not be compiled
    #[error("invalid route pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Reverse generation got the wrong number of positional arguments
    #[error("wrong number of parameters for route \"{pattern}\": expected {expected}, got {got}")]
    ParamCountMismatch {
        pattern: String,
        expected: usize,
        got: usize,
    },
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
