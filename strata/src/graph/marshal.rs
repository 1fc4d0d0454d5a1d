//! Serializable graph snapshots for external visualization
//!
//! A [`GraphSnapshot`] is a self-contained description of a graph: sorted
//! vertices and edges, nested subgraphs for vertices that wrap a graph of
//! their own, and the cycles found. Nothing else in the crate reads it back.

use super::{Graph, Vertex, VertexId};
use crate::core::{Error, Result};
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Snapshot of a graph (or subgraph)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphSnapshot {
    /// Always "Graph"
    #[serde(rename = "Type")]
    pub kind: String,

    /// Empty for the top-level graph; for a subgraph, the ID of the vertex
    /// that wraps it
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    /// Sorted by name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<SnapshotVertex>,

    /// Sorted by `"source|target"` name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<SnapshotEdge>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subgraphs: Vec<GraphSnapshot>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycles: Vec<Vec<SnapshotVertex>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotVertex {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotEdge {
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl GraphSnapshot {
    /// Encodes the snapshot as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Serialization)
    }

    /// Renders the top-level vertices and edges in Graphviz DOT format
    ///
    /// Edges point from the dependent to its dependency.
    pub fn to_dot(&self) -> String {
        let mut graph = DiGraph::<String, String>::new();
        let mut indices = HashMap::new();

        for vertex in &self.vertices {
            let idx = graph.add_node(vertex.name.clone());
            indices.insert(vertex.id.as_str(), idx);
        }
        for edge in &self.edges {
            if let (Some(&s), Some(&t)) = (
                indices.get(edge.source.as_str()),
                indices.get(edge.target.as_str()),
            ) {
                graph.add_edge(s, t, edge.name.clone());
            }
        }

        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

impl<V: Vertex> Graph<V> {
    /// Captures a snapshot of this graph for visualization
    pub fn snapshot(&self) -> GraphSnapshot {
        self.snapshot_scoped(self.name().to_string(), "")
    }

    // Nested graphs issue their own handles, so subgraph vertex IDs are
    // prefixed with the wrapping vertex's ID to keep them unique.
    fn snapshot_scoped(&self, name: String, scope: &str) -> GraphSnapshot {
        let id_of = |id: VertexId| format!("{}{}", scope, id);
        let vertex_of = |id: VertexId| SnapshotVertex {
            id: id_of(id),
            name: self.vertex_name(id),
            attrs: self
                .vertex(id)
                .and_then(Vertex::dot_attrs)
                .unwrap_or_default(),
        };

        let mut subgraphs = Vec::new();
        let mut vertices = Vec::with_capacity(self.len());
        for (id, vertex) in self.vertices() {
            if let Some(sub) = vertex.subgraph() {
                let mut snapshot = sub.snapshot_scoped(vertex.name(), &format!("{}.", id_of(id)));
                snapshot.id = id_of(id);
                subgraphs.push(snapshot);
            }
            vertices.push(vertex_of(id));
        }
        vertices.sort_by(|a, b| a.name.cmp(&b.name));

        let mut edges: Vec<SnapshotEdge> = self
            .edges()
            .into_iter()
            .map(|e| SnapshotEdge {
                name: format!("{}|{}", self.vertex_name(e.source), self.vertex_name(e.target)),
                source: id_of(e.source),
                target: id_of(e.target),
                attrs: BTreeMap::new(),
            })
            .collect();
        edges.sort_by(|a, b| a.name.cmp(&b.name));

        let cycles = self
            .cycles()
            .into_iter()
            .map(|cycle| cycle.into_iter().map(vertex_of).collect())
            .collect();

        GraphSnapshot {
            kind: "Graph".to_string(),
            id: String::new(),
            name,
            attrs: BTreeMap::new(),
            vertices,
            edges,
            subgraphs,
            cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node {
        name: &'static str,
        inner: Option<Graph<Node>>,
    }

    impl Node {
        fn leaf(name: &'static str) -> Self {
            Self { name, inner: None }
        }
    }

    impl Vertex for Node {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn subgraph(&self) -> Option<&Graph<Self>> {
            self.inner.as_ref()
        }

        fn dot_attrs(&self) -> Option<BTreeMap<String, String>> {
            self.inner
                .as_ref()
                .map(|_| BTreeMap::from([("shape".to_string(), "box".to_string())]))
        }
    }

    #[test]
    fn test_vertices_and_edges_sorted_by_name() {
        let mut graph = Graph::new();
        let z = graph.add_vertex("zeta");
        let a = graph.add_vertex("alpha");
        let m = graph.add_vertex("mu");
        graph.connect(z, m).unwrap();
        graph.connect(a, z).unwrap();

        let snapshot = graph.snapshot();

        let names: Vec<_> = snapshot.vertices.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mu", "zeta"]);

        let edges: Vec<_> = snapshot.edges.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(edges, vec!["alpha|zeta", "zeta|mu"]);
        assert_eq!(snapshot.edges[0].source, a.to_string());
        assert!(snapshot.cycles.is_empty());
    }

    #[test]
    fn test_cycles_are_listed() {
        let mut graph = Graph::new();
        let a = graph.add_vertex("a");
        let b = graph.add_vertex("b");
        graph.connect(a, b).unwrap();
        graph.connect(b, a).unwrap();

        let snapshot = graph.snapshot();

        assert_eq!(snapshot.cycles.len(), 1);
        assert_eq!(snapshot.cycles[0].len(), 2);
    }

    #[test]
    fn test_subgraphs_are_nested() {
        let mut inner = Graph::named("module.network");
        let x = inner.add_vertex(Node::leaf("aws_vpc.main"));
        let y = inner.add_vertex(Node::leaf("aws_subnet.a"));
        inner.connect(y, x).unwrap();

        let mut graph = Graph::new();
        let module = graph.add_vertex(Node {
            name: "module.network",
            inner: Some(inner),
        });
        graph.add_vertex(Node::leaf("aws_instance.web"));

        let snapshot = graph.snapshot();

        assert_eq!(snapshot.subgraphs.len(), 1);
        let sub = &snapshot.subgraphs[0];
        assert_eq!(sub.id, module.to_string());
        assert_eq!(sub.name, "module.network");
        assert_eq!(sub.vertices.len(), 2);
        assert!(sub.vertices.iter().all(|v| v.id.starts_with(&format!("{}.", module))));

        let wrapper = snapshot
            .vertices
            .iter()
            .find(|v| v.name == "module.network")
            .unwrap();
        assert_eq!(wrapper.attrs.get("shape").map(String::as_str), Some("box"));
    }

    #[test]
    fn test_json_field_names() {
        let mut graph = Graph::new();
        let a = graph.add_vertex("a");
        let b = graph.add_vertex("b");
        graph.connect(a, b).unwrap();

        let json = graph.snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["Type"], "Graph");
        assert_eq!(value["Name"], "root");
        assert_eq!(value["Vertices"][0]["ID"], a.to_string());
        assert_eq!(value["Edges"][0]["Name"], "a|b");
        assert!(value.get("Cycles").is_none());
    }

    #[test]
    fn test_dot_output() {
        let mut graph = Graph::new();
        let a = graph.add_vertex("web");
        let b = graph.add_vertex("database");
        graph.connect(a, b).unwrap();

        let dot = graph.snapshot().to_dot();

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("web"));
        assert!(dot.contains("database"));
        assert!(dot.contains("->"));
    }
}
