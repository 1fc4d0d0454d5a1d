//! Lock-guarded access to [`Changes`] shared by concurrent walk callbacks

use super::{Changes, OutputChange, ResourceInstanceChange};
use crate::addrs::{AbsOutputValue, AbsResourceInstance};
use crate::states::Generation;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// A [`Changes`] list behind a single coarse lock
///
/// Appends store a deep copy of the caller's change, and lookups hand back
/// deep copies, so the caller stays free to keep mutating its own value.
#[derive(Debug, Default)]
pub struct ChangesSync {
    changes: Mutex<Changes>,
}

impl ChangesSync {
    pub fn new(changes: Changes) -> Self {
        Self {
            changes: Mutex::new(changes),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Changes> {
        self.changes
            .lock()
            .expect("Changes Mutex poisoned - unrecoverable state")
    }

    /// Records a copy of `change`
    pub fn append_resource_instance_change(&self, change: &ResourceInstanceChange) {
        let copy = change.clone();
        self.guard().resources.push(copy);
    }

    /// Returns a copy of the latest change for `addr` and `generation`
    pub fn get_resource_instance_change(
        &self,
        addr: &AbsResourceInstance,
        generation: Generation,
    ) -> Option<ResourceInstanceChange> {
        self.guard().resource_instance(addr, generation).cloned()
    }

    /// Removes every change for `addr` and `generation`. Returns whether
    /// anything was removed.
    pub fn remove_resource_instance_change(&self, addr: &AbsResourceInstance, generation: Generation) -> bool {
        let mut changes = self.guard();
        let before = changes.resources.len();
        changes
            .resources
            .retain(|c| !(c.addr == *addr && c.generation() == generation));
        let removed = before - changes.resources.len();
        if removed > 0 {
            debug!("Removed {} planned change(s) for {} {}", removed, addr, generation);
        }
        removed > 0
    }

    /// Records a copy of `change`
    pub fn append_output_change(&self, change: &OutputChange) {
        let copy = change.clone();
        self.guard().outputs.push(copy);
    }

    pub fn get_output_change(&self, addr: &AbsOutputValue) -> Option<OutputChange> {
        self.guard().output_value(addr).cloned()
    }

    /// Number of recorded resource instance changes
    pub fn len(&self) -> usize {
        self.guard().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Returns a deep copy of everything recorded so far
    pub fn snapshot(&self) -> Changes {
        self.guard().clone()
    }

    pub fn into_changes(self) -> Changes {
        self.changes
            .into_inner()
            .expect("Changes Mutex poisoned - unrecoverable state")
    }
}

impl From<Changes> for ChangesSync {
    fn from(changes: Changes) -> Self {
        Self::new(changes)
    }
}
