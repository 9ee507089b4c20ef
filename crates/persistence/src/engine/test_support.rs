//! Shared fixtures for the engine scenario tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use game_state::{ActiveBuff, GameState};

use super::PersistenceEngine;
use crate::clock::ManualClock;
use crate::config::PersistenceConfig;
use crate::load_pipeline::parse_with_fallback;
use crate::save_types::Snapshot;
use crate::store::{MemoryStore, PersistenceStore, StoreError};

pub(super) const START_MS: u64 = 1_700_000_000_000;
pub(super) const HOUR: u64 = 3_600_000;

pub(super) fn engine_with(config: PersistenceConfig) -> (PersistenceEngine, MemoryStore, ManualClock) {
    let store = MemoryStore::new();
    let clock = ManualClock::new(START_MS);
    let engine = PersistenceEngine::new(store.clone(), clock.clone(), config);
    (engine, store, clock)
}

pub(super) fn engine() -> (PersistenceEngine, MemoryStore, ManualClock) {
    engine_with(PersistenceConfig::default())
}

/// A second engine over the same store and clock, as after a restart.
pub(super) fn reopen(store: &MemoryStore, clock: &ManualClock) -> PersistenceEngine {
    PersistenceEngine::new(store.clone(), clock.clone(), PersistenceConfig::default())
}

pub(super) fn sample_state() -> GameState {
    let mut state = GameState::default();
    state.core.earn(4_200.0);
    state.core.clicks = 310;
    state.core.level = 6;
    state.core.upgrades.insert("quill".into(), 3);
    state.core.upgrades.insert("lamp".into(), 1);
    state.core.created_at = Some(START_MS - 48 * HOUR);
    state.assistants.hire("scribe", 2);
    state.assistants.hire("archivist", 1);
    state.achievements.unlock("first_click");
    state.achievements.progress.insert("hoarder".into(), 0.5);
    state.lore.discovered.insert("archive".into());
    state.lore.discovered.insert("tower".into());
    state.lore.read.insert("archive".into());
    state.buffs.active.push(ActiveBuff {
        id: "zeal".into(),
        multiplier: 1.5,
        remaining_ms: 30_000,
    });
    state.buffs.cooldowns.insert("surge".into(), 12_000);
    state.inventory.add("ember", 14);
    state.inventory.equipped.insert("lantern".into());
    state.meta.total_play_time_ms = 5 * HOUR;
    state.meta.session_count = 3;
    state.meta.settings.insert("theme".into(), "dark".into());
    state
}

/// Text stored under `key`; panics if absent.
pub(super) fn stored(store: &MemoryStore, key: &str) -> String {
    store
        .get(key)
        .expect("memory store read")
        .unwrap_or_else(|| panic!("nothing stored under '{key}'"))
}

/// Parse stored text the way the loader does.
pub(super) fn decode(text: &str) -> Snapshot {
    parse_with_fallback(text).expect("stored text should parse").0
}

/// `core.clicks` of a stored snapshot.
pub(super) fn stored_clicks(text: &str) -> u64 {
    let snapshot = decode(text);
    let value = crate::serializer::section_value(&snapshot, game_state::Section::Core)
        .expect("core section present");
    value["clicks"].as_u64().expect("clicks is a number")
}

/// Store wrapper whose operations can be made to fail on demand.
#[derive(Clone, Default)]
pub(super) struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_get: Arc<AtomicBool>,
    pub fail_set: Arc<AtomicBool>,
    pub fail_list: Arc<AtomicBool>,
}

impl FlakyStore {
    fn check(flag: &AtomicBool, err: StoreError) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(err)
        } else {
            Ok(())
        }
    }
}

impl PersistenceStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::check(&self.fail_get, StoreError::Unavailable("read disabled".into()))?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_set, StoreError::QuotaExceeded)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Self::check(&self.fail_list, StoreError::Io("listing disabled".into()))?;
        self.inner.keys_with_prefix(prefix)
    }
}
