//! Error types for theta mapping and energy evaluation.

use thiserror::Error;

/// Errors raised by the parameter mapper and the energy evaluator.
#[derive(Debug, Error)]
pub enum HandError {
    /// A precondition on the caller's input did not hold (theta length,
    /// correspondence lengths, missing bones).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A correspondence points at a vertex the skinned mesh does not have.
    #[error("vertex index {index} out of range for skinned mesh with {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending vertex index.
        index: usize,
        /// Number of vertices in the skinned result.
        vertex_count: usize,
    },

    /// The injected model failed to produce skinned positions.
    #[error(transparent)]
    Model(#[from] anyhow::Error),
}

/// Result type for mapping and evaluation.
pub type HandResult<T> = Result<T, HandError>;
