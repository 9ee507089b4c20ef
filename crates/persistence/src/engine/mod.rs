// ---------------------------------------------------------------------------
// PersistenceEngine: the public save/load surface
// ---------------------------------------------------------------------------
//
// Owns the injected store and clock, the dirty-section tracker, the retained
// full snapshot incremental saves merge onto, and the running stats.
//
// Storage layout (default keys):
//   idle_game_save                 latest snapshot (full or incremental)
//   idle_game_save_base            full snapshot an incremental primary builds on
//   idle_game_save_backup_<ms>     previous full states, newest `max_backups` kept
//
// An incremental primary carries every section changed since the last full
// save, so base + primary always reconstruct the complete state in a fresh
// process.

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests_backup;
#[cfg(test)]
mod tests_incremental;
#[cfg(test)]
mod tests_recovery;
#[cfg(test)]
mod tests_roundtrip;

use std::time::Instant;

use bevy::prelude::*;
use game_state::{GameState, IdleTimeInfo, Section};

use crate::backup::{self, BackupEntry};
use crate::change_tracker::ChangeTracker;
use crate::clock::Clock;
use crate::config::PersistenceConfig;
use crate::idle_time;
use crate::incremental::{build_incremental_snapshot, decide_save_type, SaveReason};
use crate::load_pipeline::{parse_with_fallback, run_load_pipeline, LoadOutcome};
use crate::save_error::SaveError;
use crate::save_stages::build_full_snapshot;
use crate::save_types::{SaveType, Snapshot};
use crate::serializer::{serialize, EncodedSnapshot, MAX_SECTION_DEPTH};
use crate::stats::PersistenceStats;
use crate::store::PersistenceStore;

#[derive(Resource)]
pub struct PersistenceEngine {
    store: Box<dyn PersistenceStore>,
    clock: Box<dyn Clock>,
    config: PersistenceConfig,
    tracker: ChangeTracker,
    /// Sections changed since the full snapshot the next incremental builds on.
    since_full: ChangeTracker,
    /// Whether `config.base_key` holds that full snapshot.
    base_stored: bool,
    /// Complete state as of the last save or load.
    retained: Option<Snapshot>,
    stats: PersistenceStats,
    loaded_timestamp: Option<u64>,
    idle_time: IdleTimeInfo,
}

impl PersistenceEngine {
    pub fn new(
        store: impl PersistenceStore + 'static,
        clock: impl Clock + 'static,
        config: PersistenceConfig,
    ) -> Self {
        Self {
            store: Box::new(store),
            clock: Box::new(clock),
            config,
            tracker: ChangeTracker::new(),
            since_full: ChangeTracker::new(),
            base_stored: false,
            retained: None,
            stats: PersistenceStats::default(),
            loaded_timestamp: None,
            idle_time: IdleTimeInfo::default(),
        }
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    /// Save the live state. Returns false if nothing could be written; the
    /// in-memory state is untouched either way.
    pub async fn save(&mut self, state: &GameState, force_full: bool) -> bool {
        let started = Instant::now();
        let now = self.clock.now_ms();
        let (save_type, reason) = decide_save_type(
            force_full,
            self.config.incremental_saves,
            self.retained.is_some(),
            self.tracker.has_changes(),
        );

        let result = match save_type {
            SaveType::Full => self.write_full(state, reason, now),
            SaveType::Incremental => self.write_incremental(state, now),
        };

        match result {
            Ok(encoded) => {
                self.tracker.reset();
                self.stats.record_save(
                    save_type,
                    reason == SaveReason::Clean,
                    &encoded,
                    started.elapsed(),
                );
                info!(
                    "Saved {save_type} snapshot ({reason:?}): {} bytes, {:.1}% smaller after compaction",
                    encoded.text.len(),
                    encoded.compression_ratio * 100.0
                );
                if encoded.cycles_broken > 0 {
                    warn!(
                        "Replaced {} repeated reference(s) while saving",
                        encoded.cycles_broken
                    );
                }
                if encoded.depth_truncated > 0 {
                    warn!(
                        "Cut {} value(s) nested deeper than {MAX_SECTION_DEPTH} levels while saving",
                        encoded.depth_truncated
                    );
                }
                true
            }
            Err(e) => {
                error!("Save failed: {e}");
                self.stats.record_failed_save();
                false
            }
        }
    }

    pub async fn force_full_save(&mut self, state: &GameState) -> bool {
        self.save(state, true).await
    }

    fn write_full(
        &mut self,
        state: &GameState,
        reason: SaveReason,
        now: u64,
    ) -> Result<EncodedSnapshot, SaveError> {
        let snapshot = build_full_snapshot(state, now);
        let encoded = serialize(&snapshot)?;

        // A clean save only refreshes the timestamp of unchanged state.
        if reason != SaveReason::Clean {
            self.rotate_backups(now);
        }

        self.store
            .set(&self.config.primary_key, &encoded.text)
            .map_err(SaveError::StoreWrite)?;

        self.retained = Some(snapshot);
        self.since_full.reset();
        self.base_stored = false;
        Ok(encoded)
    }

    fn write_incremental(
        &mut self,
        state: &GameState,
        now: u64,
    ) -> Result<EncodedSnapshot, SaveError> {
        // The first incremental after a full save pins that full state under
        // the base key before the primary is overwritten.
        if !self.base_stored {
            if let Some(base) = &self.retained {
                let base_text = serialize(base)?.text;
                self.store
                    .set(&self.config.base_key, &base_text)
                    .map_err(SaveError::StoreWrite)?;
                self.base_stored = true;
            }
        }

        let mut pending = self.since_full.clone();
        for section in self.tracker.dirty_sections() {
            pending.mark(section);
        }

        let snapshot = build_incremental_snapshot(state, &pending, now);
        let encoded = serialize(&snapshot)?;
        self.store
            .set(&self.config.primary_key, &encoded.text)
            .map_err(SaveError::StoreWrite)?;

        self.since_full = pending;
        if let Some(base) = self.retained.as_mut() {
            base.merge_sections(&snapshot, &snapshot.changes);
        }
        Ok(encoded)
    }

    /// Back up the current primary and evict old backups. Never fails the
    /// save that triggered it.
    fn rotate_backups(&mut self, now: u64) {
        let primary = match self.store.get(&self.config.primary_key) {
            Ok(text) => text,
            Err(e) => {
                warn!("{}", SaveError::BackupRotation(format!("read failed: {e}")));
                self.stats.record_backup_failure();
                return;
            }
        };
        let source = primary.and_then(|text| self.backup_source(text));

        match backup::rotate(self.store.as_ref(), &self.config, source.as_deref(), now) {
            Ok(outcome) => {
                self.stats
                    .record_backup(outcome.created.is_some(), outcome.evicted.len());
            }
            Err(e) => {
                warn!("{e}");
                self.stats.record_backup_failure();
            }
        }
    }

    /// Text to back up for the current primary. An incremental primary is
    /// not restorable alone, so the retained complete state stands in for it.
    fn backup_source(&self, primary_text: String) -> Option<String> {
        let is_incremental = parse_with_fallback(&primary_text)
            .is_ok_and(|(snapshot, _)| snapshot.save_type == SaveType::Incremental);
        if !is_incremental {
            return Some(primary_text);
        }
        let retained = self.retained.as_ref()?;
        match serialize(retained) {
            Ok(encoded) => Some(encoded.text),
            Err(e) => {
                warn!("Could not encode retained state for backup: {e}");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Load the primary slot into `state`. Always leaves a playable state;
    /// returns false only when the store failed or the save is from a newer
    /// build.
    pub async fn load(&mut self, state: &mut GameState) -> bool {
        let started = Instant::now();
        let now = self.clock.now_ms();
        let report = run_load_pipeline(
            self.store.as_ref(),
            &self.config,
            state,
            &mut self.retained,
            now,
        );

        self.tracker.reset();
        match report.outcome {
            LoadOutcome::Loaded => {
                self.loaded_timestamp = report.timestamp;
                match report.save_type {
                    Some(SaveType::Incremental) => {
                        if report.used_stored_base {
                            self.since_full.reset();
                            self.base_stored = true;
                        }
                        for section in &report.changes {
                            self.since_full.mark(*section);
                        }
                    }
                    _ => {
                        self.since_full.reset();
                        self.base_stored = false;
                    }
                }
                info!(
                    "Loaded {} snapshot: {} section(s) applied, {} skipped",
                    report.save_type.map_or("unknown", SaveType::as_str),
                    report.apply.applied.len(),
                    report.apply.skipped.len()
                );
            }
            LoadOutcome::DefaultsInitialized(reason) => {
                self.loaded_timestamp = None;
                self.since_full.reset();
                self.base_stored = false;
                // Nothing stored matches the live state any more.
                self.tracker.mark_all();
                info!("Initialized default state ({reason:?})");
            }
        }

        self.idle_time = report.idle_time;
        self.stats.record_load(&report, started.elapsed());
        report.success
    }

    /// Copy the newest valid backup over the primary slot and load it.
    pub async fn restore_latest_backup(&mut self, state: &mut GameState) -> bool {
        let (found, corrupted) =
            match backup::find_valid_backup(self.store.as_ref(), &self.config.backup_prefix) {
                Ok(result) => result,
                Err(e) => {
                    error!("Failed to scan backups: {e}");
                    return false;
                }
            };
        if corrupted > 0 {
            warn!("Skipped {corrupted} corrupted backup(s)");
        }
        let Some((entry, text)) = found else {
            warn!("No valid backup to restore");
            return false;
        };

        if let Err(e) = self.store.set(&self.config.primary_key, &text) {
            error!("{}", SaveError::StoreWrite(e));
            return false;
        }
        info!("Restoring backup {}", entry.key);
        self.retained = None;
        self.load(state).await
    }

    // -----------------------------------------------------------------------
    // Housekeeping
    // -----------------------------------------------------------------------

    /// Remove the primary, the base and every backup. Returns false if any
    /// removal failed.
    pub fn clear_all_saves(&mut self) -> bool {
        let mut keys = vec![self.config.primary_key.clone(), self.config.base_key.clone()];
        keys.extend(self.list_backups().into_iter().map(|b| b.key));

        let mut ok = true;
        for key in &keys {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove '{key}': {e}");
                ok = false;
            }
        }

        self.retained = None;
        self.since_full.reset();
        self.base_stored = false;
        self.loaded_timestamp = None;
        self.tracker.reset();
        info!("Cleared all saves");
        ok
    }

    /// Forget the retained snapshot and mark every section dirty. Stored
    /// saves are kept until the next save overwrites the primary.
    pub fn start_new_game(&mut self) {
        self.retained = None;
        self.since_full.reset();
        self.base_stored = false;
        self.loaded_timestamp = None;
        self.idle_time = IdleTimeInfo::default();
        self.tracker.mark_all();
    }

    /// Backups, newest first. Store failures yield an empty list.
    pub fn list_backups(&self) -> Vec<BackupEntry> {
        backup::list_backups(self.store.as_ref(), &self.config.backup_prefix).unwrap_or_else(|e| {
            warn!("Failed to list backups: {e}");
            Vec::new()
        })
    }

    // -----------------------------------------------------------------------
    // Tracking, idle time, stats
    // -----------------------------------------------------------------------

    pub fn mark_changed(&mut self, name: &str) {
        self.tracker.mark_changed(name);
    }

    pub fn mark(&mut self, section: Section) {
        self.tracker.mark(section);
    }

    pub fn has_changes(&self) -> bool {
        self.tracker.has_changes()
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn retained_snapshot(&self) -> Option<&Snapshot> {
        self.retained.as_ref()
    }

    /// Offline time from the last loaded save to now.
    pub fn calculate_idle_time(&self) -> IdleTimeInfo {
        idle_time::compute(self.loaded_timestamp, self.clock.now_ms(), &self.config.idle)
    }

    /// Offline time computed at the last load.
    pub fn idle_time_info(&self) -> IdleTimeInfo {
        self.idle_time
    }

    pub fn stats(&self) -> &PersistenceStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}
