//! Concurrent, cancellation-aware graph traversal
//!
//! A [`Walker`] runs a [`Visitor`] against every vertex of a
//! [`Graph`](crate::graph::Graph) in dependency order. Independent branches
//! run concurrently up to [`WalkConfig::parallelism`]; a vertex starts only
//! after each of its prerequisites reached [`VertexStatus::Done`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use strata::core::Diagnostics;
//! use strata::graph::{Graph, VertexId};
//! use strata::walker::{WalkConfig, Walker};
//!
//! # async fn run() {
//! let mut graph = Graph::new();
//! let web = graph.add_vertex("aws_instance.web".to_string());
//! let vpc = graph.add_vertex("aws_vpc.main".to_string());
//! graph.connect(web, vpc).unwrap();
//!
//! let walker = Walker::new(WalkConfig::from_env());
//! let outcome = walker
//!     .walk(&graph, Arc::new(|_id: VertexId, v: Arc<String>| async move {
//!         println!("applying {}", v);
//!         Diagnostics::new()
//!     }))
//!     .await;
//! assert!(outcome.is_success());
//! # }
//! ```

mod config;
mod status;
mod visitor;
mod walk;

pub use config::{WalkConfig, WalkDirection, DEFAULT_PARALLELISM, PARALLELISM_ENV};
pub use status::{VertexStatus, WalkOutcome};
pub use visitor::Visitor;
pub use walk::Walker;
