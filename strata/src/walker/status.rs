//! Per-vertex lifecycle and walk results

use crate::core::Diagnostics;
use crate::graph::VertexId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a vertex is in its lifecycle
///
/// `Waiting → Ready → Running → Done`, or `Running → Errored`. A vertex
/// that never leaves `Waiting` or `Ready` (a prerequisite failed, or the
/// walk was cancelled) finishes the walk as `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexStatus {
    Waiting,
    Ready,
    Running,
    Done,
    Errored,
    Skipped,
}

impl fmt::Display for VertexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VertexStatus::Waiting => "waiting",
            VertexStatus::Ready => "ready",
            VertexStatus::Running => "running",
            VertexStatus::Done => "done",
            VertexStatus::Errored => "errored",
            VertexStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Result of one walk
///
/// A walk never fails as a whole: per-vertex failures, panics and structural
/// problems all arrive in [`WalkOutcome::diagnostics`], next to the final
/// status of every vertex.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub(super) statuses: BTreeMap<VertexId, VertexStatus>,
    pub(super) diagnostics: Diagnostics,
    pub(super) cancelled: bool,
}

impl WalkOutcome {
    /// Returns the final status of a vertex
    pub fn status(&self, id: VertexId) -> Option<VertexStatus> {
        self.statuses.get(&id).copied()
    }

    /// Returns all final statuses, keyed by vertex
    pub fn statuses(&self) -> &BTreeMap<VertexId, VertexStatus> {
        &self.statuses
    }

    /// Counts vertices that ended in `status`
    pub fn count(&self, status: VertexStatus) -> usize {
        self.statuses.values().filter(|s| **s == status).count()
    }

    /// Returns the vertices whose callback ran, successfully or not
    pub fn visited(&self) -> Vec<VertexId> {
        self.statuses
            .iter()
            .filter(|(_, s)| matches!(s, VertexStatus::Done | VertexStatus::Errored))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Returns true if the walk stopped scheduling because of cancellation
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Returns true if every vertex completed without errors
    pub fn is_success(&self) -> bool {
        !self.cancelled
            && !self.diagnostics.has_errors()
            && self.statuses.values().all(|s| *s == VertexStatus::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(VertexStatus::Waiting.to_string(), "waiting");
        assert_eq!(VertexStatus::Errored.to_string(), "errored");
        assert_eq!(VertexStatus::Skipped.to_string(), "skipped");
    }
}
