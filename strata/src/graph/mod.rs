//! Dependency graph for orchestration work
//!
//! This module provides graph data structures and algorithms for managing
//! dependencies between units of work. It enables:
//!
//! - Vertex and edge CRUD over an arena of stable [`VertexId`] handles
//! - Reachability queries (ancestors, descendants) and topological order
//! - Cycle detection via Tarjan's strongly connected components
//! - Transitive reduction of acyclic graphs
//! - A serializable snapshot for external visualization
//!
//! # Edge Direction
//!
//! An edge `source -> target` means *source depends on target*: target must
//! complete before source begins.
//!
//! # Design Principles
//!
//! Following Parnas's information hiding principles:
//! - This module hides the graph representation (ordered adjacency sets)
//! - Exposes only abstract operations: add_vertex, connect, dependencies_of, etc.

mod dag;
mod error;
mod marshal;
mod reduction;
mod tarjan;
mod vertex;

pub use dag::{Edge, Graph};
pub use error::{GraphError, GraphResult};
pub use marshal::{GraphSnapshot, SnapshotEdge, SnapshotVertex};
pub use vertex::{Vertex, VertexId};
