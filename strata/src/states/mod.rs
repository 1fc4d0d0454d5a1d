//! In-memory infrastructure state
//!
//! The tree is `State → Module → Resource → ResourceInstance`, where each
//! instance holds an optional current [`ResourceInstanceObject`] plus any
//! number of deposed ones. Records that no longer hold anything are pruned
//! as they empty out:
//!
//! - an instance with neither current nor deposed objects is removed;
//! - a resource left without instances is removed unless it uses `count`
//!   or `for_each` ([`EachMode`] other than `NoEach`);
//! - a non-root module with no resources, outputs or locals is removed by
//!   [`SyncState`].
//!
//! Concurrent callers go through [`SyncState`].

mod error;
mod instance;
mod module;
mod object;
mod resource;
mod state;
mod sync;

pub use error::StateError;
pub use instance::{DeposedKey, Generation, ResourceInstance};
pub use module::{Module, OutputValue};
pub use object::{ObjectStatus, ResourceInstanceObject};
pub use resource::{EachMode, Resource};
pub use state::State;
pub use sync::{StateGuard, SyncState};
