//! Dependency-driven concurrent traversal

use super::config::{WalkConfig, WalkDirection};
use super::status::{VertexStatus, WalkOutcome};
use super::visitor::Visitor;
use crate::core::{Diagnostic, Diagnostics};
use crate::graph::{Graph, Vertex, VertexId};
use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

type StatusTable = Arc<Mutex<BTreeMap<VertexId, VertexStatus>>>;

/// How a dispatched vertex task ended
enum Visit {
    Completed(Diagnostics),
    Panicked(String),
    /// The walk was cancelled before the callback started
    Cancelled,
}

/// Drives parallel topological execution of a [`Graph`]
///
/// One task is spawned per vertex as soon as all of its prerequisites are
/// `Done`. A [`Semaphore`] bounds how many callbacks run at once when
/// [`WalkConfig::parallelism`] is set. Failures never abort the walk: the
/// failed vertex's dependents are skipped while unrelated branches keep
/// running.
///
/// The walker owns a [`CancellationToken`]. Once cancelled, no new vertex
/// callback is started by this walker, including in later walks.
pub struct Walker {
    config: WalkConfig,
    cancel: CancellationToken,
}

impl Walker {
    pub fn new(config: WalkConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Returns the token observed before every callback starts
    ///
    /// Clone it into signal handlers or into callbacks that need to stop
    /// in-flight work cooperatively.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stops scheduling new vertices. Callbacks already running finish.
    pub fn cancel(&self) {
        info!("Walk cancellation requested");
        self.cancel.cancel();
    }

    /// Returns a walker for a vertex's nested graph
    ///
    /// The walker never descends into [`Vertex::subgraph`] on its own; a
    /// visitor that expands a module call walks the subgraph with a nested
    /// walker and returns the inner outcome's diagnostics as its own. The
    /// nested walker shares this walker's configuration, and cancelling
    /// this walker cancels it too.
    pub fn nested(&self) -> Walker {
        Self {
            config: self.config.clone(),
            cancel: self.cancel.child_token(),
        }
    }

    /// Walks `graph`, invoking `visitor` once per reachable vertex
    ///
    /// Returns once no further vertex can become ready and every spawned
    /// task has finished. Cyclic graphs are refused up front: every vertex
    /// is reported `Skipped` alongside one error per cycle.
    pub async fn walk<V, F>(&self, graph: &Graph<V>, visitor: Arc<F>) -> WalkOutcome
    where
        V: Vertex + Send + Sync + 'static,
        F: Visitor<V> + 'static,
    {
        let span = info_span!(
            "walk",
            graph = %graph.name(),
            vertices = graph.len(),
            direction = ?self.config.direction
        );
        self.run(graph, visitor).instrument(span).await
    }

    async fn run<V, F>(&self, graph: &Graph<V>, visitor: Arc<F>) -> WalkOutcome
    where
        V: Vertex + Send + Sync + 'static,
        F: Visitor<V> + 'static,
    {
        let mut diagnostics = graph.validate();
        if diagnostics.has_errors() {
            warn!("Refusing to walk graph {} with cycles", graph.name());
            return WalkOutcome {
                statuses: graph
                    .vertex_ids()
                    .map(|id| (id, VertexStatus::Skipped))
                    .collect(),
                diagnostics,
                cancelled: false,
            };
        }

        let direction = self.config.direction;
        let table: StatusTable = Arc::new(Mutex::new(
            graph
                .vertex_ids()
                .map(|id| (id, VertexStatus::Waiting))
                .collect(),
        ));
        let mut remaining: BTreeMap<VertexId, usize> = graph
            .vertex_ids()
            .map(|id| (id, prerequisites(graph, direction, id).len()))
            .collect();

        let semaphore = self
            .config
            .parallelism
            .map(|permits| Arc::new(Semaphore::new(permits.max(1))));
        let mut tasks: JoinSet<(VertexId, Visit)> = JoinSet::new();
        let mut spawned: HashMap<task::Id, VertexId> = HashMap::new();

        let initial: Vec<VertexId> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();
        debug!("Walk starting with {} ready vertices", initial.len());
        for id in initial {
            if let Some(task_id) =
                self.dispatch(&mut tasks, graph, id, &visitor, &semaphore, &table)
            {
                spawned.insert(task_id, id);
            }
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, visit) = match joined {
                Ok((task_id, finished)) => {
                    spawned.remove(&task_id);
                    finished
                }
                Err(err) => {
                    let id = spawned.remove(&err.id());
                    let name = id.map(|id| graph.vertex_name(id));
                    error!(
                        "Walk task for {} failed to complete: {}",
                        name.as_deref().unwrap_or("unknown vertex"),
                        err
                    );
                    diagnostics.push(task_failure(name.as_deref(), &err));
                    if let Some(id) = id {
                        set_status(&table, id, VertexStatus::Errored);
                    }
                    continue;
                }
            };

            let name = graph.vertex_name(id);
            let status = match visit {
                Visit::Completed(diags) => {
                    let failed = diags.has_errors();
                    diagnostics.extend(diags.attribute_to(&name));
                    if failed {
                        VertexStatus::Errored
                    } else {
                        VertexStatus::Done
                    }
                }
                Visit::Panicked(message) => {
                    error!("Callback for {} panicked: {}", name, message);
                    diagnostics.push(
                        Diagnostic::error("Vertex callback panicked")
                            .with_detail(message)
                            .with_vertex(name.as_str()),
                    );
                    VertexStatus::Errored
                }
                Visit::Cancelled => VertexStatus::Skipped,
            };
            debug!("Vertex {} finished: {}", name, status);
            set_status(&table, id, status);

            if status != VertexStatus::Done || self.cancel.is_cancelled() {
                continue;
            }
            for next in unlocks(graph, direction, id) {
                let Some(count) = remaining.get_mut(&next) else {
                    continue;
                };
                *count -= 1;
                if *count == 0 {
                    if let Some(task_id) =
                        self.dispatch(&mut tasks, graph, next, &visitor, &semaphore, &table)
                    {
                        spawned.insert(task_id, next);
                    }
                }
            }
        }

        let statuses = finalize(&table);
        let outcome = WalkOutcome {
            statuses,
            diagnostics,
            cancelled: self.cancel.is_cancelled(),
        };
        info!(
            "Walk finished: {} done, {} errored, {} skipped{}",
            outcome.count(VertexStatus::Done),
            outcome.count(VertexStatus::Errored),
            outcome.count(VertexStatus::Skipped),
            if outcome.cancelled { " (cancelled)" } else { "" }
        );
        outcome
    }

    /// Spawns the task for `id` and returns its runtime task id
    fn dispatch<V, F>(
        &self,
        tasks: &mut JoinSet<(VertexId, Visit)>,
        graph: &Graph<V>,
        id: VertexId,
        visitor: &Arc<F>,
        semaphore: &Option<Arc<Semaphore>>,
        table: &StatusTable,
    ) -> Option<task::Id>
    where
        V: Vertex + Send + Sync + 'static,
        F: Visitor<V> + 'static,
    {
        let vertex = graph.vertex_arc(id)?;
        set_status(table, id, VertexStatus::Ready);

        let span = info_span!("vertex", id = %id, name = %vertex.name());
        let visitor = Arc::clone(visitor);
        let semaphore = semaphore.clone();
        let cancel = self.cancel.clone();
        let table = Arc::clone(table);

        let task = async move {
            // Held until the callback returns
            let _permit = match semaphore {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return (id, Visit::Cancelled),
                },
                None => None,
            };

            if cancel.is_cancelled() {
                debug!("Walk cancelled, not starting vertex");
                return (id, Visit::Cancelled);
            }

            set_status(&table, id, VertexStatus::Running);
            let visit = match AssertUnwindSafe(visitor.visit(id, vertex))
                .catch_unwind()
                .await
            {
                Ok(diags) => Visit::Completed(diags),
                Err(payload) => Visit::Panicked(panic_message(payload.as_ref())),
            };
            (id, visit)
        };
        Some(tasks.spawn(task.instrument(span)).id())
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new(WalkConfig::default())
    }
}

fn prerequisites<V>(graph: &Graph<V>, direction: WalkDirection, id: VertexId) -> Vec<VertexId> {
    match direction {
        WalkDirection::Down => graph.dependencies_of(id),
        WalkDirection::Up => graph.dependents_of(id),
    }
}

fn unlocks<V>(graph: &Graph<V>, direction: WalkDirection, id: VertexId) -> Vec<VertexId> {
    match direction {
        WalkDirection::Down => graph.dependents_of(id),
        WalkDirection::Up => graph.dependencies_of(id),
    }
}

fn set_status(table: &StatusTable, id: VertexId, status: VertexStatus) {
    table
        .lock()
        .expect("Walk status Mutex poisoned - unrecoverable state")
        .insert(id, status);
}

/// Settles every non-terminal status once no task is outstanding
fn finalize(table: &StatusTable) -> BTreeMap<VertexId, VertexStatus> {
    let mut statuses = table
        .lock()
        .expect("Walk status Mutex poisoned - unrecoverable state");
    for status in statuses.values_mut() {
        *status = match *status {
            VertexStatus::Waiting => VertexStatus::Skipped,
            VertexStatus::Ready | VertexStatus::Running => VertexStatus::Errored,
            settled => settled,
        };
    }
    statuses.clone()
}

/// Describes a vertex task the runtime could not bring to completion
fn task_failure(vertex: Option<&str>, err: &JoinError) -> Diagnostic {
    let diagnostic = Diagnostic::error("Walk task failed to complete").with_detail(err.to_string());
    match vertex {
        Some(name) => diagnostic.with_vertex(name),
        None => diagnostic,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log) -> Arc<impl Visitor<&'static str>> {
        let log = Arc::clone(log);
        Arc::new(move |_id: VertexId, v: Arc<&'static str>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(v.to_string());
                Diagnostics::new()
            }
        })
    }

    /// a depends on b, b depends on c
    fn chain() -> (Graph<&'static str>, VertexId, VertexId, VertexId) {
        let mut graph = Graph::new();
        let a = graph.add_vertex("a");
        let b = graph.add_vertex("b");
        let c = graph.add_vertex("c");
        graph.connect(a, b).unwrap();
        graph.connect(b, c).unwrap();
        (graph, a, b, c)
    }

    #[tokio::test]
    async fn test_down_walk_runs_dependencies_first() {
        let (graph, a, _, _) = chain();
        let log: Log = Arc::default();

        let outcome = Walker::default().walk(&graph, recorder(&log)).await;

        assert!(outcome.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["c", "b", "a"]);
        assert_eq!(outcome.status(a), Some(VertexStatus::Done));
    }

    #[tokio::test]
    async fn test_up_walk_runs_dependents_first() {
        let (graph, _, _, _) = chain();
        let log: Log = Arc::default();

        let walker = Walker::new(WalkConfig::default().reverse());
        let outcome = walker.walk(&graph, recorder(&log)).await;

        assert!(outcome.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_error_blocks_dependents_only() {
        let (mut graph, a, b, c) = chain();
        let other = graph.add_vertex("other");
        let log: Log = Arc::default();

        let visitor = {
            let log = Arc::clone(&log);
            Arc::new(move |_id: VertexId, v: Arc<&'static str>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(v.to_string());
                    let mut diags = Diagnostics::new();
                    if *v == "c" {
                        diags.push(Diagnostic::error("create failed"));
                    }
                    diags
                }
            })
        };

        let outcome = Walker::default().walk(&graph, visitor).await;

        let mut visited = log.lock().unwrap().clone();
        visited.sort();
        assert_eq!(visited, vec!["c", "other"]);

        let errors: Vec<_> = outcome.diagnostics().errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].vertex(), Some("c"));

        assert_eq!(outcome.status(c), Some(VertexStatus::Errored));
        assert_eq!(outcome.status(b), Some(VertexStatus::Skipped));
        assert_eq!(outcome.status(a), Some(VertexStatus::Skipped));
        assert_eq!(outcome.status(other), Some(VertexStatus::Done));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_warnings_do_not_block() {
        let (graph, _, _, _) = chain();
        let visitor = Arc::new(|_id: VertexId, _v: Arc<&'static str>| async move {
            Diagnostics::from(Diagnostic::warning("deprecated"))
        });

        let outcome = Walker::default().walk(&graph, visitor).await;

        assert_eq!(outcome.count(VertexStatus::Done), 3);
        assert_eq!(outcome.diagnostics().warnings().count(), 3);
    }

    #[tokio::test]
    async fn test_independent_vertices_run_concurrently() {
        let mut graph = Graph::new();
        graph.add_vertex("x");
        graph.add_vertex("y");

        let visitor = Arc::new(|_id: VertexId, _v: Arc<&'static str>| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Diagnostics::new()
        });

        let start = Instant::now();
        let outcome = Walker::default().walk(&graph, visitor).await;
        let elapsed = start.elapsed();

        assert!(outcome.is_success());
        assert!(elapsed < Duration::from_millis(380), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_parallelism_bound_is_respected() {
        let mut graph = Graph::new();
        for name in ["a", "b", "c", "d", "e"] {
            graph.add_vertex(name);
        }

        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let visitor = {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            Arc::new(move |_id: VertexId, _v: Arc<&'static str>| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Diagnostics::new()
                }
            })
        };

        let walker = Walker::new(WalkConfig::default().with_parallelism(1));
        let outcome = walker.walk(&graph, visitor).await;

        assert!(outcome.is_success());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_scheduling() {
        let (graph, a, b, c) = chain();
        let walker = Walker::default();
        let token = walker.cancellation_token().clone();

        let visitor = Arc::new(move |_id: VertexId, v: Arc<&'static str>| {
            let token = token.clone();
            async move {
                if *v == "c" {
                    token.cancel();
                }
                Diagnostics::new()
            }
        });

        let outcome = walker.walk(&graph, visitor).await;

        assert!(outcome.is_cancelled());
        assert_eq!(outcome.status(c), Some(VertexStatus::Done));
        assert_eq!(outcome.status(b), Some(VertexStatus::Skipped));
        assert_eq!(outcome.status(a), Some(VertexStatus::Skipped));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_cancelled_walker_starts_nothing() {
        let (graph, _, _, _) = chain();
        let log: Log = Arc::default();

        let walker = Walker::default();
        walker.cancel();
        let outcome = walker.walk(&graph, recorder(&log)).await;

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(outcome.count(VertexStatus::Skipped), 3);
    }

    #[tokio::test]
    async fn test_panic_is_captured_as_error() {
        let mut graph = Graph::new();
        let bad = graph.add_vertex("bad");
        let dependent = graph.add_vertex("dependent");
        let fine = graph.add_vertex("fine");
        graph.connect(dependent, bad).unwrap();

        let visitor = Arc::new(|_id: VertexId, v: Arc<&'static str>| async move {
            if *v == "bad" {
                panic!("provider crashed");
            }
            Diagnostics::new()
        });

        let outcome = Walker::default().walk(&graph, visitor).await;

        assert_eq!(outcome.status(bad), Some(VertexStatus::Errored));
        assert_eq!(outcome.status(dependent), Some(VertexStatus::Skipped));
        assert_eq!(outcome.status(fine), Some(VertexStatus::Done));

        let errors: Vec<_> = outcome.diagnostics().errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].vertex(), Some("bad"));
        assert_eq!(errors[0].detail(), Some("provider crashed"));
    }

    #[tokio::test]
    async fn test_cyclic_graph_is_refused() {
        let mut graph = Graph::new();
        let a = graph.add_vertex("a");
        let b = graph.add_vertex("b");
        graph.connect(a, b).unwrap();
        graph.connect(b, a).unwrap();
        let log: Log = Arc::default();

        let outcome = Walker::default().walk(&graph, recorder(&log)).await;

        assert!(log.lock().unwrap().is_empty());
        assert!(outcome.diagnostics().has_errors());
        assert_eq!(outcome.count(VertexStatus::Skipped), 2);
    }

    #[tokio::test]
    async fn test_nested_walker_follows_parent_cancellation() {
        let (graph, _, _, _) = chain();
        let log: Log = Arc::default();

        let walker = Walker::new(WalkConfig::default().with_parallelism(2));
        let nested = walker.nested();
        assert_eq!(nested.config().parallelism, Some(2));

        walker.cancel();
        assert!(nested.cancellation_token().is_cancelled());

        let outcome = nested.walk(&graph, recorder(&log)).await;
        assert!(log.lock().unwrap().is_empty());
        assert!(outcome.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelling_nested_walker_leaves_parent_running() {
        let walker = Walker::default();
        walker.nested().cancel();
        assert!(!walker.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_task_failure_names_the_vertex() {
        let mut tasks: JoinSet<()> = JoinSet::new();
        let spawned = tasks
            .spawn(async { panic!("runtime lost the task") })
            .id();

        let err = match tasks.join_next_with_id().await {
            Some(Err(err)) => err,
            _ => panic!("expected a failed task"),
        };
        assert_eq!(err.id(), spawned);

        let diagnostic = task_failure(Some("aws_vpc.main"), &err);
        assert_eq!(diagnostic.vertex(), Some("aws_vpc.main"));
        assert_eq!(diagnostic.summary(), "Walk task failed to complete");

        assert_eq!(task_failure(None, &err).vertex(), None);
    }

    #[tokio::test]
    async fn test_empty_graph() {
        let graph: Graph<&'static str> = Graph::new();
        let log: Log = Arc::default();

        let outcome = Walker::default().walk(&graph, recorder(&log)).await;

        assert!(outcome.is_success());
        assert!(outcome.statuses().is_empty());
    }
}
