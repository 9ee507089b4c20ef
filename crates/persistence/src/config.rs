//! Engine configuration.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::save_error::SaveError;

/// Default storage key of the primary slot.
pub const DEFAULT_PRIMARY_KEY: &str = "idle_game_save";

/// Default storage key holding the full snapshot an incremental primary
/// builds on.
pub const DEFAULT_BASE_KEY: &str = "idle_game_save_base";

/// Default prefix of backup keys (followed by a millisecond timestamp).
pub const DEFAULT_BACKUP_PREFIX: &str = "idle_game_save_backup_";

/// Default number of backups kept.
pub const DEFAULT_MAX_BACKUPS: usize = 3;

/// Offline time is never credited beyond this (24 hours).
pub const DEFAULT_MAX_IDLE_MS: u64 = 24 * 60 * 60 * 1000;

/// Offline time must exceed this to count as idle (5 minutes).
pub const DEFAULT_IDLE_THRESHOLD_MS: u64 = 5 * 60 * 1000;

/// Limits applied when computing offline time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub max_idle_ms: u64,
    pub idle_threshold_ms: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            max_idle_ms: DEFAULT_MAX_IDLE_MS,
            idle_threshold_ms: DEFAULT_IDLE_THRESHOLD_MS,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub primary_key: String,
    /// Written when the first incremental save follows a full one.
    pub base_key: String,
    pub backup_prefix: String,
    pub max_backups: usize,
    pub backups_enabled: bool,
    /// When false every save is a full save.
    pub incremental_saves: bool,
    pub idle: IdleConfig,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            base_key: DEFAULT_BASE_KEY.to_string(),
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            max_backups: DEFAULT_MAX_BACKUPS,
            backups_enabled: true,
            incremental_saves: true,
            idle: IdleConfig::default(),
        }
    }
}

impl PersistenceConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(text)?)
    }
}
