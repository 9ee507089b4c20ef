//! Save/load engine for the progression game.
//!
//! Snapshots the live `GameState` into seven sections, writes full or
//! dirty-only incremental snapshots behind a checksummed text envelope,
//! rotates timestamped backups, and recovers from corrupt, legacy or missing
//! saves by falling back to a fresh game.

pub mod autosave;
pub mod backup;
pub mod change_tracker;
pub mod clock;
pub mod config;
pub mod engine;
pub mod envelope;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_store;
pub mod idle_time;
pub mod incremental;
pub mod load_pipeline;
pub mod save_error;
pub mod save_plugin;
pub mod save_restore;
pub mod save_stages;
pub mod save_types;
pub mod serializer;
pub mod stats;
pub mod store;
#[cfg(target_arch = "wasm32")]
pub mod wasm_storage;

pub use autosave::{AutosaveConfig, AutosaveTimer};
pub use backup::BackupEntry;
pub use change_tracker::ChangeTracker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{IdleConfig, PersistenceConfig};
pub use engine::PersistenceEngine;
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStore;
pub use load_pipeline::{DefaultsReason, LoadOutcome, LoadReport};
pub use save_error::SaveError;
pub use save_plugin::{
    ChangedSections, LoadGameEvent, NewGameEvent, PersistenceOutcome, PersistencePlugin,
    SaveGameEvent,
};
pub use save_types::{SaveType, Snapshot};
pub use serializer::EncodedSnapshot;
pub use stats::PersistenceStats;
pub use store::{MemoryStore, PersistenceStore, StoreError};
#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageStore;
