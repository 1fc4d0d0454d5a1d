use thiserror::Error as ThisError;

use super::diagnostics::Diagnostics;
use crate::graph::GraphError;
use crate::states::StateError;

/// Top-level error type for strata.
///
/// Most operations in this crate report through [`Diagnostics`] or are
/// infallible; this type exists for callers that want a single `?`-able
/// error at their boundary.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum Error {
    /// A graph operation failed (unknown vertex, cycle, etc.)
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// A state value supplied from outside could not be accepted.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// One or more error diagnostics were produced.
    #[error("{0}")]
    Diagnostics(Diagnostics),

    /// A snapshot could not be encoded.
    #[error("serialization failed")]
    Serialization(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
