//! Running persistence counters for diagnostics.

use std::time::Duration;

use serde::Serialize;

use crate::load_pipeline::{LoadOutcome, LoadReport};
use crate::save_types::SaveType;
use crate::serializer::EncodedSnapshot;

/// Process-lifetime counters. Only `reset()` clears them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersistenceStats {
    pub save_count: u64,
    pub failed_saves: u64,
    pub full_saves: u64,
    pub incremental_saves: u64,
    /// Full saves taken only because nothing was dirty; no backup is made.
    pub clean_saves: u64,
    pub total_save_ms: f64,
    pub average_save_ms: f64,

    pub load_count: u64,
    pub failed_loads: u64,
    pub total_load_ms: f64,
    pub average_load_ms: f64,
    pub last_load_loaded: Option<bool>,

    pub last_uncompressed_len: usize,
    pub last_compressed_len: usize,
    pub last_compression_ratio: f64,

    pub backups_created: u64,
    pub backups_evicted: u64,
    pub backup_failures: u64,
    pub cycles_broken: u64,
    pub depth_truncated: u64,
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

impl PersistenceStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a save that reached the store write.
    pub fn record_save(
        &mut self,
        save_type: SaveType,
        clean: bool,
        encoded: &EncodedSnapshot,
        elapsed: Duration,
    ) {
        self.save_count += 1;
        match save_type {
            SaveType::Full => self.full_saves += 1,
            SaveType::Incremental => self.incremental_saves += 1,
        }
        if clean {
            self.clean_saves += 1;
        }
        self.total_save_ms += millis(elapsed);
        self.average_save_ms = self.total_save_ms / self.save_count as f64;

        self.last_uncompressed_len = encoded.uncompressed_len;
        self.last_compressed_len = encoded.compressed_len;
        self.last_compression_ratio = encoded.compression_ratio;
        self.cycles_broken += u64::from(encoded.cycles_broken);
        self.depth_truncated += u64::from(encoded.depth_truncated);
    }

    pub fn record_failed_save(&mut self) {
        self.failed_saves += 1;
    }

    pub fn record_backup(&mut self, created: bool, evicted: usize) {
        if created {
            self.backups_created += 1;
        }
        self.backups_evicted += evicted as u64;
    }

    pub fn record_backup_failure(&mut self) {
        self.backup_failures += 1;
    }

    pub fn record_load(&mut self, report: &LoadReport, elapsed: Duration) {
        self.load_count += 1;
        if !report.success {
            self.failed_loads += 1;
        }
        self.total_load_ms += millis(elapsed);
        self.average_load_ms = self.total_load_ms / self.load_count as f64;
        self.last_load_loaded = Some(report.outcome == LoadOutcome::Loaded);
    }
}
