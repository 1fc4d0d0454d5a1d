//! Vertex handles and capabilities
//!
//! Vertices are owned by the [`Graph`] that stores them. Each insertion is
//! assigned a fresh [`VertexId`] from a per-graph counter, so identity never
//! depends on the payload's address or on its equality: two equal payloads
//! added twice are two distinct vertices.

use super::Graph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable handle to a vertex within one [`Graph`]
///
/// Handles are assigned in insertion order and never reused by the graph
/// that issued them, which makes ordering by handle a deterministic
/// "insertion order" for every traversal in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(u64);

impl VertexId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload stored at a graph vertex
///
/// Only [`Vertex::name`] is required. The other methods are optional
/// capabilities; the defaults report that the capability is absent. The
/// snapshot exporter reads both, and visitors read [`Vertex::subgraph`] to
/// walk a nested graph with [`Walker::nested`](crate::walker::Walker::nested).
pub trait Vertex {
    /// Human-readable name used in diagnostics and snapshots
    fn name(&self) -> String;

    /// Returns the nested graph this vertex wraps, if any (for example a
    /// module call that expands to its own graph)
    fn subgraph(&self) -> Option<&Graph<Self>>
    where
        Self: Sized,
    {
        None
    }

    /// Returns extra attributes for visualization, if any
    fn dot_attrs(&self) -> Option<BTreeMap<String, String>> {
        None
    }
}

impl Vertex for String {
    fn name(&self) -> String {
        self.clone()
    }
}

impl Vertex for &'static str {
    fn name(&self) -> String {
        (*self).to_string()
    }
}
