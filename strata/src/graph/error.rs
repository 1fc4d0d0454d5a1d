//! Error types for graph operations
//!
//! This module hides error representation details and provides
//! a unified error type for all graph operations.

use super::VertexId;
use thiserror::Error;

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur during graph operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// A handle did not refer to a vertex of this graph
    #[error("Vertex not found: {id}")]
    VertexNotFound {
        /// The handle that was not found
        id: VertexId,
    },

    /// A cycle was found where an ordering was required
    #[error("Cycle detected in dependency graph: {}", members.join(", "))]
    CycleDetected {
        /// Names of the cycle members, in discovery order
        members: Vec<String>,
    },

    /// An operation that is only defined on acyclic graphs was requested
    /// on a graph that contains cycles
    #[error("Graph is not acyclic ({} cycle(s)); refusing {operation}", cycles.len())]
    NotAcyclic {
        /// The operation that was refused
        operation: &'static str,
        /// Names of the members of every cycle found
        cycles: Vec<Vec<String>>,
    },
}

impl GraphError {
    /// Creates a vertex not found error
    pub fn vertex_not_found(id: VertexId) -> Self {
        Self::VertexNotFound { id }
    }

    /// Creates a cycle detected error with the given member names
    pub fn cycle(members: Vec<String>) -> Self {
        Self::CycleDetected { members }
    }

    /// Creates a not-acyclic error for the named operation
    pub fn not_acyclic(operation: &'static str, cycles: Vec<Vec<String>>) -> Self {
        Self::NotAcyclic { operation, cycles }
    }
}
