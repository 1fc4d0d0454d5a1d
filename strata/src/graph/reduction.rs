//! Transitive reduction
//!
//! Removes every edge `u -> w` for which another path `u -> v -> ... -> w`
//! already exists. The reduced graph has the same reachability, so a walk
//! over it respects exactly the same ordering with fewer redundant waits.

use super::error::{GraphError, GraphResult};
use super::{Graph, Vertex};
use tracing::debug;

impl<V: Vertex> Graph<V> {
    /// Reduces the graph to the minimal edge set with the same reachability
    ///
    /// Reduction is only defined on acyclic graphs. A graph with cycles is
    /// rejected with [`GraphError::NotAcyclic`] and left unchanged.
    pub fn transitive_reduction(&mut self) -> GraphResult<()> {
        let cycles = self.cycle_names();
        if !cycles.is_empty() {
            return Err(GraphError::not_acyclic("transitive reduction", cycles));
        }

        let mut removed = 0usize;
        let ids: Vec<_> = self.vertex_ids().collect();
        for u in ids {
            let direct = self.dependencies_of(u);
            for v in &direct {
                for w in self.ancestors(*v) {
                    if self.remove_edge(u, w) {
                        removed += 1;
                    }
                }
            }
        }

        debug!("Transitive reduction removed {} edge(s)", removed);
        Ok(())
    }
}
