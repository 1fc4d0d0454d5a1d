//! Strongly connected components (Tarjan's algorithm)
//!
//! A single depth-first pass assigns every vertex a discovery index and a
//! lowlink: the smallest index reachable from its DFS subtree through at
//! most one back-edge. A vertex whose lowlink equals its own index is the
//! root of a component, and the component is everything above it on the
//! explicit stack.
//!
//! Traversal follows dependency edges and starts vertices in insertion
//! order, so component membership order is reproducible. Components come
//! out in reverse topological order of the condensed graph.

use super::{Graph, Vertex, VertexId};
use std::collections::HashMap;

struct Tarjan<'g, V> {
    graph: &'g Graph<V>,
    next_index: usize,
    index: HashMap<VertexId, usize>,
    lowlink: HashMap<VertexId, usize>,
    stack: Vec<VertexId>,
    on_stack: HashMap<VertexId, bool>,
    components: Vec<Vec<VertexId>>,
}

impl<'g, V> Tarjan<'g, V> {
    fn new(graph: &'g Graph<V>) -> Self {
        Self {
            graph,
            next_index: 0,
            index: HashMap::new(),
            lowlink: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashMap::new(),
            components: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<VertexId>> {
        for id in self.graph.vertex_ids() {
            if !self.index.contains_key(&id) {
                self.visit(id);
            }
        }
        self.components
    }

    fn discover(&mut self, v: VertexId) -> Frame {
        let index = self.next_index;
        self.next_index += 1;
        self.index.insert(v, index);
        self.lowlink.insert(v, index);
        self.stack.push(v);
        self.on_stack.insert(v, true);
        Frame {
            vertex: v,
            dependencies: self.graph.dependencies_of(v),
            cursor: 0,
        }
    }

    /// Depth-first search from `root` using an explicit frame stack, so
    /// chain depth is bounded by the heap rather than the thread stack.
    fn visit(&mut self, root: VertexId) {
        let mut frames = vec![self.discover(root)];

        while let Some(frame) = frames.last_mut() {
            let v = frame.vertex;
            if let Some(&w) = frame.dependencies.get(frame.cursor) {
                frame.cursor += 1;
                if !self.index.contains_key(&w) {
                    let next = self.discover(w);
                    frames.push(next);
                } else if self.on_stack.get(&w).copied().unwrap_or(false) {
                    // Back edge into the current path
                    let low = self.lowlink[&v].min(self.index[&w]);
                    self.lowlink.insert(v, low);
                }
                continue;
            }

            frames.pop();
            if self.lowlink[&v] == self.index[&v] {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack.insert(w, false);
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                self.components.push(component);
            }
            if let Some(parent) = frames.last() {
                let p = parent.vertex;
                let low = self.lowlink[&p].min(self.lowlink[&v]);
                self.lowlink.insert(p, low);
            }
        }
    }
}

/// One suspended vertex in the depth-first search
struct Frame {
    vertex: VertexId,
    dependencies: Vec<VertexId>,
    cursor: usize,
}

impl<V> Graph<V> {
    /// Returns the strongly connected components of the graph
    ///
    /// Every vertex belongs to exactly one component. With `cycles_only`,
    /// only components that represent a cycle are returned: those with more
    /// than one member, and single vertices with a self-loop.
    pub fn strongly_connected_components(&self, cycles_only: bool) -> Vec<Vec<VertexId>> {
        let components = Tarjan::new(self).run();
        if !cycles_only {
            return components;
        }
        components
            .into_iter()
            .filter(|c| c.len() > 1 || self.has_edge(c[0], c[0]))
            .collect()
    }

    /// Returns every dependency cycle, self-loops included
    pub fn cycles(&self) -> Vec<Vec<VertexId>> {
        self.strongly_connected_components(true)
    }
}

impl<V: Vertex> Graph<V> {
    /// Returns every dependency cycle as member names, for reporting
    pub fn cycle_names(&self) -> Vec<Vec<String>> {
        self.cycles().iter().map(|c| self.names(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Builds a graph from `source -> target` lines, adding vertices in
    /// order of first appearance.
    fn parse(text: &str) -> (Graph<String>, HashMap<String, VertexId>) {
        let mut graph = Graph::new();
        let mut ids = HashMap::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (source, target) = line.split_once("->").unwrap();
            let mut id_of = |name: &str| {
                *ids.entry(name.to_string())
                    .or_insert_with(|| graph.add_vertex(name.to_string()))
            };
            let s = id_of(source.trim());
            let t = id_of(target.trim());
            graph.connect(s, t).unwrap();
        }
        (graph, ids)
    }

    #[test]
    fn test_single_cycle() {
        let (graph, _) = parse(
            "a -> b
             a -> c
             b -> c
             c -> b
             c -> d
             d -> e",
        );

        let all = graph.strongly_connected_components(false);
        assert_eq!(all.len(), 4);

        let cycles = graph.cycle_names();
        assert_eq!(cycles, vec![vec!["c".to_string(), "b".to_string()]]);
    }

    #[test]
    fn test_three_member_cycle_order() {
        let (graph, _) = parse(
            "a -> b
             a -> c
             b -> d
             b -> e
             c -> f
             c -> g
             g -> a",
        );

        let cycles = graph.cycle_names();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["g", "c", "a"]);
    }

    #[test]
    fn test_acyclic_graph_has_singletons() {
        let (graph, _) = parse(
            "a -> b
             b -> c
             a -> c",
        );

        let all = graph.strongly_connected_components(false);
        assert_eq!(all.len(), graph.len());
        assert!(all.iter().all(|c| c.len() == 1));
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut graph = Graph::new();
        let a = graph.add_vertex("a");
        let b = graph.add_vertex("b");
        graph.connect(a, a).unwrap();
        graph.connect(b, a).unwrap();

        assert_eq!(graph.cycles(), vec![vec![a]]);
    }

    #[test]
    fn test_components_in_reverse_topological_order() {
        let (graph, ids) = parse(
            "a -> b
             b -> c",
        );

        let all = graph.strongly_connected_components(false);
        assert_eq!(all, vec![vec![ids["c"]], vec![ids["b"]], vec![ids["a"]]]);
    }

    #[test]
    fn test_same_component_iff_mutually_reachable() {
        let (graph, _) = parse(
            "a -> b
             b -> c
             c -> a
             c -> d
             d -> e
             e -> d
             e -> f
             g -> a",
        );

        let components = graph.strongly_connected_components(false);
        let component_of = |id: VertexId| {
            components
                .iter()
                .position(|c| c.contains(&id))
                .unwrap()
        };

        let ids: Vec<VertexId> = graph.vertex_ids().collect();
        let seen: BTreeSet<VertexId> = components.iter().flatten().copied().collect();
        assert_eq!(seen.len(), ids.len());

        for &x in &ids {
            for &y in &ids {
                if x == y {
                    continue;
                }
                let mutual = graph.ancestors(x).contains(&y) && graph.ancestors(y).contains(&x);
                assert_eq!(component_of(x) == component_of(y), mutual);
            }
        }
    }

    #[test]
    fn test_deep_chain_does_not_exhaust_stack() {
        const DEPTH: usize = 50_000;
        let mut graph = Graph::new();
        let ids: Vec<VertexId> = (0..DEPTH).map(|i| graph.add_vertex(i.to_string())).collect();
        for pair in ids.windows(2) {
            graph.connect(pair[0], pair[1]).unwrap();
        }

        assert!(graph.cycles().is_empty());
        let all = graph.strongly_connected_components(false);
        assert_eq!(all.len(), DEPTH);
        assert_eq!(all[0], vec![ids[DEPTH - 1]]);
        assert_eq!(all[DEPTH - 1], vec![ids[0]]);

        // Closing the chain turns it into a single component
        graph.connect(ids[DEPTH - 1], ids[0]).unwrap();
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), DEPTH);
    }
}
