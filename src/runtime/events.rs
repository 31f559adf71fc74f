//! Runtime event stream payloads.

use crate::types::DrillKey;

/// Events emitted from the single-writer runtime loop after a change has
/// been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillEvent {
    /// A drill was created or replaced.
    Saved {
        /// Key of the stored drill.
        key: DrillKey,
    },
    /// A drill was deleted, or a deletion found nothing to delete.
    Removed {
        /// Key that no longer holds a drill.
        key: DrillKey,
    },
    /// An external table was merged.
    Imported {
        /// Number of merged entries.
        entries: usize,
    },
    /// The table was reloaded from storage.
    Reloaded {
        /// Number of drills after reload.
        drills: usize,
    },
}
