use std::sync::atomic::Ordering;

use futures_lite::future::block_on;
use game_state::{GameState, IdleTimeInfo, Section};

use super::test_support::*;
use super::PersistenceEngine;
use crate::clock::ManualClock;
use crate::config::PersistenceConfig;
use crate::store::PersistenceStore;

fn defaults_with_idle() -> GameState {
    let mut state = GameState::default();
    state.idle_time = Some(IdleTimeInfo::default());
    state
}

fn flaky_engine() -> (PersistenceEngine, FlakyStore) {
    let store = FlakyStore::default();
    let engine = PersistenceEngine::new(
        store.clone(),
        ManualClock::new(START_MS),
        PersistenceConfig::default(),
    );
    (engine, store)
}

#[test]
fn test_garbled_primary_recovers_to_defaults() {
    let (mut engine, store, _clock) = engine();
    store
        .set(&engine.config().primary_key, "{\"_version\":2,\"core\":{\"clicks\":")
        .unwrap();

    let mut state = sample_state();
    assert!(block_on(engine.load(&mut state)));
    assert_eq!(state, defaults_with_idle());
    assert_eq!(engine.stats().last_load_loaded, Some(false));
    assert_eq!(engine.stats().failed_loads, 0);
    // Every section differs from storage now.
    assert_eq!(engine.tracker().dirty_sections().len(), Section::COUNT);
}

#[test]
fn test_truncated_save_recovers_to_defaults() {
    let (mut engine, store, clock) = engine();
    assert!(block_on(engine.save(&sample_state(), false)));
    let key = engine.config().primary_key.clone();
    let text = stored(&store, &key);
    store.set(&key, &text[..text.len() / 2]).unwrap();

    let mut fresh = reopen(&store, &clock);
    let mut state = sample_state();
    assert!(block_on(fresh.load(&mut state)));
    assert_eq!(state, defaults_with_idle());
}

#[test]
fn test_flipped_byte_fails_checksum() {
    let (mut engine, store, clock) = engine();
    assert!(block_on(engine.save(&sample_state(), false)));
    let key = engine.config().primary_key.clone();
    let tampered = stored(&store, &key).replace("scribe", "scrybe");
    store.set(&key, &tampered).unwrap();

    let mut fresh = reopen(&store, &clock);
    let mut state = GameState::default();
    assert!(block_on(fresh.load(&mut state)));
    assert!(state.assistants.owned.is_empty());
}

#[test]
fn test_headerless_payload_still_loads() {
    let (mut engine, store, _clock) = engine();
    store
        .set(
            &engine.config().primary_key,
            r#"{"_version":1,"_timestamp":1,"core":{"clicks":12,"level":4},"lore":{"discovered":["archive"]}}"#,
        )
        .unwrap();

    let mut state = GameState::default();
    assert!(block_on(engine.load(&mut state)));
    assert_eq!(state.core.clicks, 12);
    assert_eq!(state.core.level, 4);
    assert!(state.lore.discovered.contains("archive"));
    assert_eq!(engine.stats().last_load_loaded, Some(true));
}

#[test]
fn test_legacy_flat_save_is_discarded() {
    let (mut engine, store, _clock) = engine();
    store
        .set(
            &engine.config().primary_key,
            r#"{"saveVersion":3,"player":{"essence":5000,"level":40},"gameData":{}}"#,
        )
        .unwrap();

    let mut state = sample_state();
    assert!(block_on(engine.load(&mut state)));
    // No migration: nothing from the old payload survives.
    assert_eq!(state, defaults_with_idle());
    assert!(engine.retained_snapshot().is_none());
}

#[test]
fn test_meta_without_core_is_legacy() {
    let (mut engine, store, _clock) = engine();
    store
        .set(
            &engine.config().primary_key,
            r#"{"_version":2,"_saveType":"full","meta":{"sessionCount":9}}"#,
        )
        .unwrap();
    let mut state = sample_state();
    assert!(block_on(engine.load(&mut state)));
    assert_eq!(state.meta.session_count, 0);
}

#[test]
fn test_newer_version_returns_false() {
    let (mut engine, store, _clock) = engine();
    store
        .set(&engine.config().primary_key, r#"{"_version":7,"core":{}}"#)
        .unwrap();
    let mut state = sample_state();
    assert!(!block_on(engine.load(&mut state)));
    assert_eq!(state, defaults_with_idle());
    assert_eq!(engine.stats().failed_loads, 1);
}

#[test]
fn test_store_read_failure_returns_false() {
    let (mut engine, store) = flaky_engine();
    store.fail_get.store(true, Ordering::SeqCst);
    let mut state = sample_state();
    assert!(!block_on(engine.load(&mut state)));
    assert_eq!(state, defaults_with_idle());
    assert_eq!(engine.stats().failed_loads, 1);
}

#[test]
fn test_store_write_failure_keeps_playing() {
    let (mut engine, store) = flaky_engine();
    let state = sample_state();
    store.fail_set.store(true, Ordering::SeqCst);

    assert!(!block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().failed_saves, 1);
    assert_eq!(engine.stats().save_count, 0);
    assert!(engine.retained_snapshot().is_none());

    engine.mark_changed("core");
    store.fail_set.store(false, Ordering::SeqCst);
    assert!(block_on(engine.save(&state, false)));
    assert!(!engine.has_changes());
}

#[test]
fn test_failed_incremental_keeps_dirty_flags() {
    let (mut engine, store) = flaky_engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    state.core.clicks += 5;
    engine.mark_changed("core");
    store.fail_set.store(true, Ordering::SeqCst);
    assert!(!block_on(engine.save(&state, false)));
    assert!(engine.has_changes());

    store.fail_set.store(false, Ordering::SeqCst);
    assert!(block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().incremental_saves, 1);
}
