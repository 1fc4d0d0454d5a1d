//! Planned changes
//!
//! A plan is an append-only list of [`ResourceInstanceChange`]s, each aimed
//! at one object of a resource instance (its current object or one deposed
//! object), plus [`OutputChange`]s. Walk callbacks record into a shared
//! [`ChangesSync`].

mod change;
mod changes;
mod sync;

pub use change::{Action, OutputChange, ResourceInstanceChange};
pub use changes::Changes;
pub use sync::ChangesSync;
