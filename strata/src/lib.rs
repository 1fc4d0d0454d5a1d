//! Strata: dependency-ordered infrastructure orchestration core
//!
//! `strata` walks a graph of infrastructure work items (create, update or
//! destroy one resource each) concurrently and in dependency order, while
//! vertex callbacks record results into shared, lock-guarded state and
//! plan stores.
//!
//! # Features
//!
//! - **Dependency graph**: vertex/edge CRUD, reachability, Tarjan cycle
//!   detection, transitive reduction and JSON/DOT snapshots
//! - **Concurrent walks**: one task per ready vertex, bounded parallelism,
//!   down and up passes, cooperative cancellation
//! - **Error isolation**: a failing vertex blocks only what depends on it;
//!   every failure is reported through [`Diagnostics`]
//! - **State store**: modules, resources and instances with current and
//!   deposed objects, pruned as they empty out
//! - **Change store**: an append-only ledger of planned changes keyed by
//!   instance address and generation
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use strata::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let vpc_addr = AbsResourceInstance::root_managed("aws_vpc", "main");
//!     let web_addr = AbsResourceInstance::root_managed("aws_instance", "web");
//!
//!     let mut graph = Graph::new();
//!     let vpc = graph.add_vertex(vpc_addr.to_string());
//!     let web = graph.add_vertex(web_addr.to_string());
//!     graph.connect(web, vpc).unwrap();
//!
//!     let state = Arc::new(SyncState::default());
//!     let walker = Walker::new(WalkConfig::from_env());
//!
//!     let outcome = walker
//!         .walk(&graph, {
//!             let state = Arc::clone(&state);
//!             Arc::new(move |_id: VertexId, name: Arc<String>| {
//!                 let state = Arc::clone(&state);
//!                 let addr = if name.starts_with("aws_vpc") {
//!                     vpc_addr.clone()
//!                 } else {
//!                     web_addr.clone()
//!                 };
//!                 async move {
//!                     state.set_resource_instance_current(
//!                         &addr,
//!                         Some(ResourceInstanceObject::new(json!({ "id": name.as_str() }))),
//!                         AbsProviderConfig::root("aws"),
//!                     );
//!                     Diagnostics::new()
//!                 }
//!             })
//!         })
//!         .await;
//!
//!     assert!(outcome.is_success());
//! }
//! ```
//!
//! # Module Organization
//!
//! Each module hides one design decision that is likely to change:
//!
//! - [`addrs`]: Address types (hides rendering and parsing of addresses)
//! - [`core`]: Diagnostics and the crate error type
//! - [`graph`]: Dependency graph (hides vertex storage and traversal order)
//! - [`walker`]: Concurrent traversal (hides scheduling strategy)
//! - [`states`]: State tree and its synchronized wrapper (hides pruning rules)
//! - [`plans`]: Planned changes and their synchronized wrapper

pub mod addrs;
pub mod core;
pub mod graph;
pub mod plans;
pub mod states;
pub mod walker;

pub use core::{Diagnostic, Diagnostics, Error, Result, Severity};

pub use graph::{Graph, GraphError, GraphResult, GraphSnapshot, Vertex, VertexId};

pub use walker::{VertexStatus, Visitor, WalkConfig, WalkDirection, WalkOutcome, Walker};

pub use states::{DeposedKey, Generation, StateError, SyncState};

pub use plans::{Action, ChangesSync, ResourceInstanceChange};

// Re-export dependencies used in public API
pub use serde_json;
pub use tokio;
pub use tokio_util;

/// Prelude module for convenient glob imports
///
/// # Example
///
/// ```
/// use strata::prelude::*;
/// ```
pub mod prelude {
    pub use crate::addrs::{
        AbsOutputValue, AbsProviderConfig, AbsResource, AbsResourceInstance, InstanceKey,
        ModuleInstance,
    };

    pub use crate::core::{Diagnostic, Diagnostics, Error, Result, Severity};

    pub use crate::graph::{Graph, GraphError, GraphResult, Vertex, VertexId};

    pub use crate::walker::{
        VertexStatus, Visitor, WalkConfig, WalkDirection, WalkOutcome, Walker,
    };

    pub use crate::states::{
        DeposedKey, EachMode, Generation, ResourceInstanceObject, State, StateError, SyncState,
    };

    pub use crate::plans::{Action, Changes, ChangesSync, OutputChange, ResourceInstanceChange};

    pub use std::sync::Arc;
}
