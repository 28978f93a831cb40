//! Error types for the SQL function surface.

use meridian_spatial::SpatialError;
use thiserror::Error;

/// Result type for function handlers and registration.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Errors reported through the host's error channel. Every variant
/// carries the SQL function name so the statement-level diagnostic names
/// the operation that failed.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("{function}: wrong number of arguments")]
    ArgumentCount { function: &'static str },

    #[error("{function}: argument must be {expected}")]
    ArgumentType {
        function: &'static str,
        expected: &'static str,
    },

    #[error("{function}: {source}")]
    Spatial {
        function: &'static str,
        #[source]
        source: SpatialError,
    },

    #[error("{function}: {reason}")]
    Aggregate {
        function: &'static str,
        reason: String,
    },

    #[error("failed to register {function}: {reason}")]
    Registration { function: String, reason: String },
}

impl ExtensionError {
    pub fn spatial(function: &'static str, source: SpatialError) -> Self {
        ExtensionError::Spatial { function, source }
    }
}
