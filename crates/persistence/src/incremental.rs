//! Dirty-only capture and the save-type decision.

use game_state::GameState;

use crate::change_tracker::ChangeTracker;
use crate::save_stages::build_snapshot;
use crate::save_types::{SaveType, Snapshot};

/// Why a save took the shape it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    /// Caller asked for a full save.
    Forced,
    /// Incremental saves are switched off in the config.
    IncrementalDisabled,
    /// Nothing to merge an incremental onto.
    NoRetainedBase,
    /// No dirty sections. Rewrites the full state without a backup.
    Clean,
    /// Dirty sections only.
    Dirty,
}

/// Pick full or incremental.
///
/// Full when forced, when incremental saves are off, when no full snapshot is
/// retained, or when nothing changed; incremental otherwise.
pub fn decide_save_type(
    force_full: bool,
    incremental_enabled: bool,
    has_retained_base: bool,
    has_changes: bool,
) -> (SaveType, SaveReason) {
    if force_full {
        (SaveType::Full, SaveReason::Forced)
    } else if !incremental_enabled {
        (SaveType::Full, SaveReason::IncrementalDisabled)
    } else if !has_retained_base {
        (SaveType::Full, SaveReason::NoRetainedBase)
    } else if !has_changes {
        (SaveType::Full, SaveReason::Clean)
    } else {
        (SaveType::Incremental, SaveReason::Dirty)
    }
}

/// Capture only the dirty sections, naming them in `changes`.
pub fn build_incremental_snapshot(
    state: &GameState,
    tracker: &ChangeTracker,
    now_ms: u64,
) -> Snapshot {
    let dirty = tracker.dirty_sections();
    let mut snapshot = build_snapshot(state, &dirty, SaveType::Incremental, now_ms);
    snapshot.changes = dirty;
    snapshot
}
