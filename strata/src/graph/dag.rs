//! Graph - dependency graph over units of work
//!
//! This module provides the core data structure for representing work
//! dependencies as a directed graph.
//!
//! # Design
//!
//! The graph uses a bidirectional adjacency representation:
//! - `dependencies`: vertices this vertex depends on (outgoing edges)
//! - `dependents`: vertices that depend on this vertex (incoming edges)
//!
//! This allows direct access to both directions, which the walker needs in
//! order to run "down" (dependencies first) and "up" (dependents first)
//! passes with the same readiness logic.
//!
//! Adjacency is stored in ordered sets keyed by [`VertexId`]. Handles are
//! issued in insertion order, so every traversal is deterministic and a
//! duplicate edge between the same ordered pair is impossible.

use super::error::{GraphError, GraphResult};
use super::{Vertex, VertexId};
use crate::core::{Diagnostic, Diagnostics};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

/// A directed edge: `source` depends on `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: VertexId,
    pub target: VertexId,
}

#[derive(Debug)]
struct Node<V> {
    vertex: Arc<V>,
    /// Vertices that must complete before this one can run (outgoing edges)
    dependencies: BTreeSet<VertexId>,
    /// Vertices that depend on this one (incoming edges)
    dependents: BTreeSet<VertexId>,
}

impl<V> Clone for Node<V> {
    fn clone(&self) -> Self {
        Self {
            vertex: Arc::clone(&self.vertex),
            dependencies: self.dependencies.clone(),
            dependents: self.dependents.clone(),
        }
    }
}

/// A directed graph of work items
///
/// The Graph maintains:
/// - All vertices, each behind a stable [`VertexId`]
/// - Dependencies between vertices (edges)
/// - Bidirectional access to dependencies and dependents
///
/// # Example
///
/// ```
/// use strata::Graph;
///
/// let mut graph = Graph::new();
///
/// let vpc = graph.add_vertex("aws_vpc.main");
/// let subnet = graph.add_vertex("aws_subnet.private");
/// let instance = graph.add_vertex("aws_instance.web");
///
/// // The subnet depends on the VPC, the instance on the subnet
/// graph.connect(subnet, vpc).unwrap();
/// graph.connect(instance, subnet).unwrap();
///
/// let order = graph.topological_order().unwrap();
/// assert_eq!(order, vec![vpc, subnet, instance]);
/// ```
#[derive(Debug)]
pub struct Graph<V> {
    name: String,
    nodes: BTreeMap<VertexId, Node<V>>,
    next_id: u64,
}

impl<V> Clone for Graph<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            next_id: self.next_id,
        }
    }
}

impl<V> Default for Graph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Graph<V> {
    /// Creates a new empty graph
    pub fn new() -> Self {
        Self {
            name: String::from("root"),
            nodes: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Creates a new empty graph with the given display name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new()
        }
    }

    /// Returns the graph's display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of vertices in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a vertex and returns its handle
    pub fn add_vertex(&mut self, vertex: V) -> VertexId {
        let id = VertexId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                vertex: Arc::new(vertex),
                dependencies: BTreeSet::new(),
                dependents: BTreeSet::new(),
            },
        );
        id
    }

    /// Removes a vertex together with every edge touching it
    ///
    /// Returns the removed payload, or `None` if the handle is unknown.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<Arc<V>> {
        let node = self.nodes.remove(&id)?;
        for dep in &node.dependencies {
            if let Some(n) = self.nodes.get_mut(dep) {
                n.dependents.remove(&id);
            }
        }
        for dependent in &node.dependents {
            if let Some(n) = self.nodes.get_mut(dependent) {
                n.dependencies.remove(&id);
            }
        }
        Some(node.vertex)
    }

    /// Swaps the payload stored at `id`, keeping its edges
    pub fn replace(&mut self, id: VertexId, vertex: V) -> GraphResult<Arc<V>> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| GraphError::vertex_not_found(id))?;
        Ok(std::mem::replace(&mut node.vertex, Arc::new(vertex)))
    }

    /// Adds an edge: `source` depends on `target`
    ///
    /// This means `target` must complete before `source` can run. Adding an
    /// edge that already exists is a no-op. A self-loop is accepted and is
    /// reported later as a cycle.
    pub fn connect(&mut self, source: VertexId, target: VertexId) -> GraphResult<()> {
        if !self.nodes.contains_key(&source) {
            return Err(GraphError::vertex_not_found(source));
        }
        if !self.nodes.contains_key(&target) {
            return Err(GraphError::vertex_not_found(target));
        }

        if let Some(node) = self.nodes.get_mut(&source) {
            node.dependencies.insert(target);
        }
        if let Some(node) = self.nodes.get_mut(&target) {
            node.dependents.insert(source);
        }
        Ok(())
    }

    /// Removes the edge `source -> target`, returning whether it existed
    pub fn remove_edge(&mut self, source: VertexId, target: VertexId) -> bool {
        let removed = self
            .nodes
            .get_mut(&source)
            .is_some_and(|n| n.dependencies.remove(&target));
        if let Some(node) = self.nodes.get_mut(&target) {
            node.dependents.remove(&source);
        }
        removed
    }

    /// Returns true if the edge `source -> target` exists
    pub fn has_edge(&self, source: VertexId, target: VertexId) -> bool {
        self.nodes
            .get(&source)
            .is_some_and(|n| n.dependencies.contains(&target))
    }

    /// Returns true if the handle refers to a vertex of this graph
    pub fn contains(&self, id: VertexId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the payload stored at `id`
    pub fn vertex(&self, id: VertexId) -> Option<&V> {
        self.nodes.get(&id).map(|n| n.vertex.as_ref())
    }

    pub(crate) fn vertex_arc(&self, id: VertexId) -> Option<Arc<V>> {
        self.nodes.get(&id).map(|n| Arc::clone(&n.vertex))
    }

    /// Returns all vertex handles in insertion order
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.nodes.keys().copied()
    }

    /// Returns all vertices with their handles, in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &V)> + '_ {
        self.nodes.iter().map(|(id, n)| (*id, n.vertex.as_ref()))
    }

    /// Returns every edge, ordered by source then target
    pub fn edges(&self) -> Vec<Edge> {
        self.nodes
            .iter()
            .flat_map(|(source, node)| {
                node.dependencies.iter().map(move |target| Edge {
                    source: *source,
                    target: *target,
                })
            })
            .collect()
    }

    /// Returns the number of edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.dependencies.len()).sum()
    }

    /// Returns the direct dependencies of `id` (targets of its outgoing edges)
    pub fn dependencies_of(&self, id: VertexId) -> Vec<VertexId> {
        self.nodes
            .get(&id)
            .map(|n| n.dependencies.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the direct dependents of `id` (sources of its incoming edges)
    pub fn dependents_of(&self, id: VertexId) -> Vec<VertexId> {
        self.nodes
            .get(&id)
            .map(|n| n.dependents.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns vertices with no dependencies
    ///
    /// These are the vertices a "down" walk can start immediately.
    pub fn roots(&self) -> Vec<VertexId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.dependencies.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns vertices that nothing depends on
    pub fn leaves(&self) -> Vec<VertexId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.dependents.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns every vertex that `id` transitively depends on
    pub fn ancestors(&self, id: VertexId) -> BTreeSet<VertexId> {
        self.reachable(id, |n| &n.dependencies)
    }

    /// Returns every vertex that transitively depends on `id`
    pub fn descendants(&self, id: VertexId) -> BTreeSet<VertexId> {
        self.reachable(id, |n| &n.dependents)
    }

    fn reachable(
        &self,
        start: VertexId,
        next: impl Fn(&Node<V>) -> &BTreeSet<VertexId>,
    ) -> BTreeSet<VertexId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<VertexId> = match self.nodes.get(&start) {
            Some(node) => next(node).iter().copied().collect(),
            None => return seen,
        };

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                queue.extend(next(node).iter().copied().filter(|n| !seen.contains(n)));
            }
        }
        seen
    }
}

impl<V: Vertex> Graph<V> {
    /// Returns the display name of `id`, or the handle itself when unknown
    pub fn vertex_name(&self, id: VertexId) -> String {
        self.vertex(id)
            .map(Vertex::name)
            .unwrap_or_else(|| id.to_string())
    }

    pub(crate) fn names(&self, ids: &[VertexId]) -> Vec<String> {
        ids.iter().map(|id| self.vertex_name(*id)).collect()
    }

    /// Returns an ordering in which every vertex follows all of its
    /// dependencies
    ///
    /// Uses Kahn's algorithm; ties are broken by insertion order so the
    /// result is deterministic.
    ///
    /// Returns an error naming the members of a cycle if one exists.
    ///
    /// # Algorithm
    ///
    /// 1. Count the unmet dependencies of every vertex
    /// 2. Queue every vertex with none
    /// 3. While the queue is not empty:
    ///    a. Remove a vertex, append it to the result
    ///    b. For each dependent, decrement its count
    ///    c. If the count becomes 0, queue it
    /// 4. If the result is shorter than the graph, there is a cycle
    pub fn topological_order(&self) -> GraphResult<Vec<VertexId>> {
        let mut unmet: BTreeMap<VertexId, usize> = self
            .nodes
            .iter()
            .map(|(id, n)| (*id, n.dependencies.len()))
            .collect();
        let mut queue: VecDeque<VertexId> = unmet
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            result.push(id);
            for dependent in &self.nodes[&id].dependents {
                if let Some(count) = unmet.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            let members = self
                .cycles()
                .first()
                .map(|cycle| self.names(cycle))
                .unwrap_or_default();
            return Err(GraphError::cycle(members));
        }

        Ok(result)
    }

    /// Validates the graph for walking
    ///
    /// Produces one error diagnostic per cycle (including self-loops). The
    /// graph is never repaired.
    pub fn validate(&self) -> Diagnostics {
        self.cycles()
            .into_iter()
            .map(|cycle| {
                let names = self.names(&cycle);
                Diagnostic::error("Cycle in dependency graph")
                    .with_detail(format!("Cycle: {}", names.join(", ")))
            })
            .collect()
    }
}
