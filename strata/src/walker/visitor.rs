//! Per-vertex work callbacks

use crate::core::Diagnostics;
use crate::graph::VertexId;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Work performed for each vertex during a walk
///
/// The returned diagnostics decide the vertex's fate: any error marks it
/// `Errored` and blocks everything that waits on it. Implementations that
/// run long should watch the walker's cancellation token themselves; the
/// walker only stops scheduling new vertices.
///
/// Plain async closures implement this trait:
///
/// ```
/// use std::sync::Arc;
/// use strata::core::Diagnostics;
/// use strata::graph::VertexId;
///
/// let visitor = Arc::new(|_id: VertexId, name: Arc<String>| async move {
///     println!("visiting {}", name);
///     Diagnostics::new()
/// });
/// # let _ = visitor;
/// ```
#[async_trait]
pub trait Visitor<V>: Send + Sync {
    async fn visit(&self, id: VertexId, vertex: Arc<V>) -> Diagnostics;
}

#[async_trait]
impl<V, F, Fut> Visitor<V> for F
where
    V: Send + Sync + 'static,
    F: Fn(VertexId, Arc<V>) -> Fut + Send + Sync,
    Fut: Future<Output = Diagnostics> + Send + 'static,
{
    async fn visit(&self, id: VertexId, vertex: Arc<V>) -> Diagnostics {
        (self)(id, vertex).await
    }
}
