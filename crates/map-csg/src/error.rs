//! Error taxonomy for the map pipeline.

use thiserror::Error;

/// Errors raised while reading a map or deriving its geometry.
///
/// There are no retries anywhere in the pipeline; every error aborts the
/// computation that produced it. Recoverable degeneracies (a skipped split
/// vertex) are logged instead of raised.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed map text: missing brace, bad number, wrong token count.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Geometry too degenerate to continue (sliver split, vertex-less brush).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A structural invariant that the algorithms rely on did not hold.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The map parsed but contains nothing to build.
    #[error("map has no usable geometry")]
    EmptyMap,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a parse error tagged with a 1-based line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates a degenerate-geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry(message.into())
    }

    /// Creates an invariant-violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}
