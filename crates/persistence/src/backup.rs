//! Timestamped backup rotation.
//!
//! Before a full save overwrites the primary slot, the previous primary text
//! is copied to `<prefix><ms timestamp>`. Afterwards every backup beyond the
//! newest `max_backups` is removed. A backup therefore always holds an older
//! state than the one being written.

use bevy::prelude::*;

use crate::config::PersistenceConfig;
use crate::save_error::SaveError;
use crate::serializer::{deserialize, deserialize_raw};
use crate::store::{PersistenceStore, StoreError};

/// A backup key and the timestamp encoded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub key: String,
    pub timestamp: u64,
}

/// What one rotation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupOutcome {
    /// Key of the backup written, if any.
    pub created: Option<String>,
    /// Keys removed by eviction.
    pub evicted: Vec<String>,
}

pub fn backup_key(prefix: &str, timestamp: u64) -> String {
    format!("{prefix}{timestamp}")
}

/// Timestamp encoded in a backup key. Keys with a non-numeric suffix are not
/// backups.
pub fn parse_backup_timestamp(prefix: &str, key: &str) -> Option<u64> {
    let suffix = key.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// All backups, newest first.
pub fn list_backups(
    store: &dyn PersistenceStore,
    prefix: &str,
) -> Result<Vec<BackupEntry>, StoreError> {
    let mut entries: Vec<BackupEntry> = store
        .keys_with_prefix(prefix)?
        .into_iter()
        .filter_map(|key| {
            let timestamp = parse_backup_timestamp(prefix, &key)?;
            Some(BackupEntry { key, timestamp })
        })
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.key.cmp(&a.key)));
    Ok(entries)
}

/// Whether stored text would load: enveloped with a valid checksum, or a
/// headerless payload that parses.
pub fn is_valid_save_text(text: &str) -> bool {
    !text.trim().is_empty() && (deserialize(text).is_ok() || deserialize_raw(text).is_ok())
}

/// Write `primary_text` under a fresh backup key. If a backup with the same
/// timestamp exists, the timestamp is bumped until the key is free.
pub fn create_backup(
    store: &dyn PersistenceStore,
    prefix: &str,
    primary_text: &str,
    now_ms: u64,
) -> Result<String, StoreError> {
    let mut timestamp = now_ms;
    let mut key = backup_key(prefix, timestamp);
    while store.get(&key)?.is_some() {
        timestamp += 1;
        key = backup_key(prefix, timestamp);
    }
    store.set(&key, primary_text)?;
    Ok(key)
}

/// Remove every backup beyond the newest `max_backups`. Returns removed keys.
pub fn evict_excess(
    store: &dyn PersistenceStore,
    prefix: &str,
    max_backups: usize,
) -> Result<Vec<String>, StoreError> {
    let entries = list_backups(store, prefix)?;
    let mut evicted = Vec::new();
    for entry in entries.into_iter().skip(max_backups) {
        store.remove(&entry.key)?;
        evicted.push(entry.key);
    }
    Ok(evicted)
}

/// Back up the current primary text (if present and valid), then evict.
///
/// # Errors
///
/// `SaveError::BackupRotation` on any store failure. Callers log it and
/// carry on with the save.
pub fn rotate(
    store: &dyn PersistenceStore,
    config: &PersistenceConfig,
    primary_text: Option<&str>,
    now_ms: u64,
) -> Result<BackupOutcome, SaveError> {
    let mut outcome = BackupOutcome::default();
    if !config.backups_enabled || config.max_backups == 0 {
        return Ok(outcome);
    }

    match primary_text {
        Some(text) if is_valid_save_text(text) => {
            let key = create_backup(store, &config.backup_prefix, text, now_ms)
                .map_err(|e| SaveError::BackupRotation(format!("create failed: {e}")))?;
            info!("Created backup {key}");
            outcome.created = Some(key);
        }
        Some(_) => {
            warn!("Primary save failed validation; not backing it up");
        }
        None => {}
    }

    outcome.evicted = evict_excess(store, &config.backup_prefix, config.max_backups)
        .map_err(|e| SaveError::BackupRotation(format!("eviction failed: {e}")))?;
    for key in &outcome.evicted {
        info!("Evicted backup {key}");
    }
    Ok(outcome)
}

/// First backup, newest first, that passes validation. Also returns how many
/// newer backups were rejected.
pub fn find_valid_backup(
    store: &dyn PersistenceStore,
    prefix: &str,
) -> Result<(Option<(BackupEntry, String)>, usize), StoreError> {
    let mut corrupted = 0;
    for entry in list_backups(store, prefix)? {
        let Some(text) = store.get(&entry.key)? else {
            continue;
        };
        if is_valid_save_text(&text) {
            return Ok((Some((entry, text)), corrupted));
        }
        warn!("Backup {} is corrupted", entry.key);
        corrupted += 1;
    }
    Ok((None, corrupted))
}
