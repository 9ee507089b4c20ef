// ---------------------------------------------------------------------------
// Load / recovery pipeline
// ---------------------------------------------------------------------------
//
//   read primary ──none──────────────────────────────► Defaults(NoData)
//        │ text
//   deserialize ──err──► deserialize_raw ──err───────► Defaults(Corrupt)
//        │ snapshot            │ snapshot
//        ▼◄────────────────────┘
//   version check ──newer────────────────────────────► Defaults(NewerVersion)
//   legacy detect ──retired schema───────────────────► Defaults(Legacy)
//   apply (full, or incremental merged onto the retained or stored base)
//   idle compute ────────────────────────────────────► Loaded
//
// Every path ends in one of the two terminal outcomes. Nothing is returned
// as an error; the report carries whatever went wrong.

use bevy::prelude::*;
use game_state::{GameState, IdleTimeInfo, Section};

use crate::config::PersistenceConfig;
use crate::idle_time;
use crate::save_error::SaveError;
use crate::save_restore::{apply_snapshot, ApplyReport};
use crate::save_types::*;
use crate::serializer::{deserialize, deserialize_raw};
use crate::store::PersistenceStore;

/// Why the live state was reset instead of loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultsReason {
    NoData,
    /// Stored text failed both parse attempts.
    Corrupt,
    /// Retired schema. Discarded on purpose, never migrated.
    Legacy,
    /// Written by a newer build.
    NewerVersion,
    /// The store could not be read.
    StoreUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    DefaultsInitialized(DefaultsReason),
}

#[derive(Debug)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    /// Value returned by `load()`: true unless the store failed or the save
    /// is from a newer build.
    pub success: bool,
    pub save_type: Option<SaveType>,
    /// `_timestamp` of the loaded primary.
    pub timestamp: Option<u64>,
    /// Parsed only on the second, envelope-free attempt.
    pub used_raw_fallback: bool,
    /// An incremental primary was merged onto the full snapshot read from
    /// the base key.
    pub used_stored_base: bool,
    /// Sections named by an incremental primary.
    pub changes: Vec<Section>,
    pub apply: ApplyReport,
    pub idle_time: IdleTimeInfo,
    pub error: Option<SaveError>,
}

impl LoadReport {
    fn defaults(reason: DefaultsReason, success: bool, error: Option<SaveError>) -> Self {
        Self {
            outcome: LoadOutcome::DefaultsInitialized(reason),
            success,
            save_type: None,
            timestamp: None,
            used_raw_fallback: false,
            used_stored_base: false,
            changes: Vec::new(),
            apply: ApplyReport::default(),
            idle_time: IdleTimeInfo::default(),
            error,
        }
    }
}

/// Parse stored text: enveloped first, then as a bare payload.
///
/// Returns the snapshot and whether the bare fallback was needed. The error
/// of the first attempt is the one reported.
pub fn parse_with_fallback(text: &str) -> Result<(Snapshot, bool), SaveError> {
    match deserialize(text) {
        Ok(snapshot) => Ok((snapshot, false)),
        Err(first) => match deserialize_raw(text) {
            Ok(snapshot) => {
                info!("Save had no valid envelope; parsed as a bare payload");
                Ok((snapshot, true))
            }
            Err(_) => Err(first),
        },
    }
}

/// Reject snapshots from a newer build.
pub fn check_version(snapshot: &Snapshot) -> Result<(), SaveError> {
    if snapshot.version > CURRENT_SNAPSHOT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: CURRENT_SNAPSHOT_VERSION,
            found: snapshot.version,
        });
    }
    Ok(())
}

/// Markers of the retired flat schema: one of its top-level fields, or a
/// full snapshot carrying `meta` without `core`.
pub fn detect_legacy(snapshot: &Snapshot) -> Option<SaveError> {
    if let Some(field) = snapshot
        .unknown_fields
        .iter()
        .find(|f| RETIRED_TOP_LEVEL_FIELDS.contains(&f.as_str()))
    {
        return Some(SaveError::LegacyFormat(format!(
            "retired top-level field '{field}'"
        )));
    }
    if snapshot.save_type == SaveType::Full
        && snapshot.has_section(Section::Meta)
        && !snapshot.has_section(Section::Core)
    {
        return Some(SaveError::LegacyFormat(
            "meta section without core section".to_string(),
        ));
    }
    None
}

/// Reset live state to a fresh game with an inactive idle report.
pub fn initialize_defaults(state: &mut GameState, retained: &mut Option<Snapshot>) {
    state.set_defaults();
    state.idle_time = Some(IdleTimeInfo::default());
    *retained = None;
}

/// Apply a parsed snapshot. Full snapshots become the retained base;
/// incrementals are merged onto it, or applied alone when there is none.
pub fn apply_loaded(
    state: &mut GameState,
    retained: &mut Option<Snapshot>,
    snapshot: Snapshot,
) -> ApplyReport {
    match snapshot.save_type {
        SaveType::Full => {
            let report = apply_snapshot(state, &snapshot);
            *retained = Some(snapshot);
            report
        }
        SaveType::Incremental => match retained {
            Some(base) => {
                base.merge_sections(&snapshot, &snapshot.changes);
                apply_snapshot(state, base)
            }
            None => {
                warn!(
                    "Incremental save with no retained base; applying its {} section(s) alone",
                    snapshot.section_count()
                );
                apply_snapshot(state, &snapshot)
            }
        },
    }
}

/// The full snapshot stored under `base_key`, if one is there and usable.
pub fn load_stored_base(store: &dyn PersistenceStore, base_key: &str) -> Option<Snapshot> {
    let text = match store.get(base_key) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read base snapshot '{base_key}': {e}");
            return None;
        }
    };
    let base = match parse_with_fallback(&text) {
        Ok((snapshot, _)) => snapshot,
        Err(e) => {
            warn!("Base snapshot '{base_key}' is unreadable: {e}");
            return None;
        }
    };
    if base.save_type != SaveType::Full
        || check_version(&base).is_err()
        || detect_legacy(&base).is_some()
    {
        warn!("Base snapshot '{base_key}' is not a usable full snapshot");
        return None;
    }
    Some(base)
}

/// Run the whole pipeline against the configured primary key.
pub fn run_load_pipeline(
    store: &dyn PersistenceStore,
    config: &PersistenceConfig,
    state: &mut GameState,
    retained: &mut Option<Snapshot>,
    now_ms: u64,
) -> LoadReport {
    let primary_key = config.primary_key.as_str();
    let text = match store.get(primary_key) {
        Ok(Some(text)) => text,
        Ok(None) => {
            info!("No save found under '{primary_key}'; starting fresh");
            initialize_defaults(state, retained);
            return LoadReport::defaults(DefaultsReason::NoData, true, Some(SaveError::NoData));
        }
        Err(e) => {
            error!("Failed to read save '{primary_key}': {e}");
            initialize_defaults(state, retained);
            return LoadReport::defaults(
                DefaultsReason::StoreUnavailable,
                false,
                Some(SaveError::StoreRead(e)),
            );
        }
    };

    let (snapshot, used_raw_fallback) = match parse_with_fallback(&text) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Save is unreadable, starting fresh: {e}");
            initialize_defaults(state, retained);
            return LoadReport::defaults(DefaultsReason::Corrupt, true, Some(e));
        }
    };

    if let Err(e) = check_version(&snapshot) {
        error!("{e}");
        initialize_defaults(state, retained);
        return LoadReport::defaults(DefaultsReason::NewerVersion, false, Some(e));
    }

    if let Some(e) = detect_legacy(&snapshot) {
        warn!("Discarding save: {e}");
        initialize_defaults(state, retained);
        return LoadReport::defaults(DefaultsReason::Legacy, true, Some(e));
    }

    let save_type = snapshot.save_type;
    let timestamp = snapshot.timestamp;
    let changes = snapshot.changes.clone();
    let mut used_stored_base = false;
    if save_type == SaveType::Incremental && retained.is_none() {
        *retained = load_stored_base(store, &config.base_key);
        used_stored_base = retained.is_some();
    }
    let apply = apply_loaded(state, retained, snapshot);
    if !apply.skipped.is_empty() {
        warn!("Skipped {} malformed section(s) on load", apply.skipped.len());
    }

    let idle = idle_time::compute(timestamp, now_ms, &config.idle);
    state.idle_time = Some(idle);

    LoadReport {
        outcome: LoadOutcome::Loaded,
        success: true,
        save_type: Some(save_type),
        timestamp,
        used_raw_fallback,
        used_stored_base,
        changes,
        apply,
        idle_time: idle,
        error: None,
    }
}
