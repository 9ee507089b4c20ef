use std::sync::atomic::Ordering;

use futures_lite::future::block_on;
use game_state::{GameState, Section};

use super::test_support::*;
use super::PersistenceEngine;
use crate::clock::ManualClock;
use crate::config::PersistenceConfig;
use crate::save_types::SaveType;
use crate::store::PersistenceStore;

#[test]
fn test_five_full_saves_keep_three_backups() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();

    for save in 1..=5u64 {
        state.core.clicks = save;
        engine.mark_changed("core");
        assert!(block_on(engine.force_full_save(&state)));
        clock.advance(1_000);
    }

    let backups = engine.list_backups();
    assert_eq!(backups.len(), 3);
    // Newest first: written before saves #5, #4, #3, holding the states of
    // saves #4, #3, #2.
    let contents: Vec<u64> = backups
        .iter()
        .map(|b| stored_clicks(&stored(&store, &b.key)))
        .collect();
    assert_eq!(contents, vec![4, 3, 2]);
    assert_eq!(stored_clicks(&stored(&store, &engine.config().primary_key)), 5);
    assert_eq!(engine.stats().backups_created, 4);
    assert_eq!(engine.stats().backups_evicted, 1);
}

#[test]
fn test_incremental_save_never_backs_up() {
    let (mut engine, _store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    for _ in 0..4 {
        state.inventory.add("ember", 1);
        engine.mark(Section::Inventory);
        clock.advance(500);
        assert!(block_on(engine.save(&state, false)));
    }

    assert_eq!(engine.stats().incremental_saves, 4);
    assert!(engine.list_backups().is_empty());
}

#[test]
fn test_backups_disabled() {
    let config = PersistenceConfig {
        backups_enabled: false,
        ..PersistenceConfig::default()
    };
    let (mut engine, _store, clock) = engine_with(config);
    let state = sample_state();
    for _ in 0..3 {
        clock.advance(10);
        assert!(block_on(engine.force_full_save(&state)));
    }
    assert!(engine.list_backups().is_empty());
}

#[test]
fn test_backup_of_incremental_primary_holds_complete_state() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    state.core.clicks = 1;
    assert!(block_on(engine.save(&state, false)));

    state.core.clicks = 2;
    engine.mark_changed("core");
    clock.advance(1_000);
    assert!(block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().incremental_saves, 1);

    state.core.clicks = 3;
    clock.advance(1_000);
    assert!(block_on(engine.force_full_save(&state)));

    let backups = engine.list_backups();
    assert_eq!(backups.len(), 1);
    let backup = decode(&stored(&store, &backups[0].key));
    assert_eq!(backup.save_type, SaveType::Full);
    assert_eq!(backup.section_count(), Section::COUNT);
    assert_eq!(stored_clicks(&stored(&store, &backups[0].key)), 2);
}

#[test]
fn test_rotation_failure_does_not_block_save() {
    let store = FlakyStore::default();
    let mut engine = PersistenceEngine::new(
        store.clone(),
        ManualClock::new(START_MS),
        PersistenceConfig::default(),
    );
    let state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    store.fail_list.store(true, Ordering::SeqCst);
    assert!(block_on(engine.force_full_save(&state)));
    assert_eq!(engine.stats().backup_failures, 1);
    assert_eq!(engine.stats().save_count, 2);
    assert!(store.inner.get(&engine.config().primary_key).unwrap().is_some());
}

#[test]
fn test_restore_latest_backup_skips_corrupt_ones() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    for save in 1..=3u64 {
        state.core.clicks = save;
        clock.advance(1_000);
        assert!(block_on(engine.force_full_save(&state)));
    }
    // Backups hold clicks 1 and 2; damage the newest one and the primary.
    let backups = engine.list_backups();
    assert_eq!(backups.len(), 2);
    store.set(&backups[0].key, "IDLESAVE|1|00000000|{}").unwrap();
    store.set(&engine.config().primary_key, "garbage").unwrap();

    let mut restored = GameState::default();
    assert!(block_on(engine.restore_latest_backup(&mut restored)));
    assert_eq!(restored.core.clicks, 1);
    assert_eq!(restored.inventory, state.inventory);
}

#[test]
fn test_restore_without_backups_fails() {
    let (mut engine, _store, _clock) = engine();
    let mut state = sample_state();
    assert!(!block_on(engine.restore_latest_backup(&mut state)));
    assert_eq!(state, sample_state());
}

#[test]
fn test_clear_all_saves_removes_everything() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));
    state.lore.read.insert("tower".into());
    engine.mark_changed("lore");
    clock.advance(10);
    assert!(block_on(engine.save(&state, false)));
    clock.advance(10);
    assert!(block_on(engine.force_full_save(&state)));
    assert!(!store.is_empty());

    assert!(engine.clear_all_saves());
    assert!(store.is_empty());
    assert!(engine.retained_snapshot().is_none());

    let mut loaded = sample_state();
    assert!(block_on(engine.load(&mut loaded)));
    assert_eq!(loaded.core, GameState::default().core);
}
