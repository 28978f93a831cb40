//! Error types for spatial values and operations.

use thiserror::Error;

/// Result type for spatial operations.
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Errors produced by the geometry value model, the planar kernel, and the
/// coordinate reference service.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A textual or binary geometry could not be parsed.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An operation was applied to a geometry variant it does not support.
    #[error("{operation} not defined for {detail}")]
    Domain {
        operation: &'static str,
        detail: String,
    },

    /// Two inputs of a binary operation carry conflicting SRIDs.
    #[error("SRID mismatch: {left} vs {right}")]
    SridMismatch { left: i32, right: i32 },

    /// A coordinate transformation was requested for a geometry whose SRID
    /// is undefined (-1).
    #[error("source geometry has undefined SRID (-1)")]
    UndefinedSourceSrid,

    /// The coordinate reference service cannot build a pipeline for the
    /// requested SRID pair.
    #[error("unsupported transformation from SRID {source_srid} to SRID {target}")]
    UnsupportedTransformation { source_srid: i32, target: i32 },
}

impl SpatialError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SpatialError::InvalidGeometry(message.into())
    }

    pub(crate) fn domain(operation: &'static str, detail: impl Into<String>) -> Self {
        SpatialError::Domain {
            operation,
            detail: detail.into(),
        }
    }
}
