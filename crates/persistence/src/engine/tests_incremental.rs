use futures_lite::future::block_on;
use game_state::{GameState, Section};

use super::test_support::*;
use crate::config::PersistenceConfig;
use crate::save_types::SaveType;
use crate::serializer::section_value;

#[test]
fn test_dirty_sections_only_after_full_save() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    state.lore.read.insert("tower".into());
    engine.mark_changed("lore");
    clock.advance(1_000);
    assert!(block_on(engine.save(&state, false)));

    let primary = decode(&stored(&store, &engine.config().primary_key));
    assert_eq!(primary.save_type, SaveType::Incremental);
    assert_eq!(primary.changes, vec![Section::Lore]);
    assert_eq!(primary.section_count(), 1);
    assert_eq!(primary.timestamp, Some(START_MS + 1_000));

    let base = decode(&stored(&store, &engine.config().base_key));
    assert_eq!(base.save_type, SaveType::Full);
    assert_eq!(base.timestamp, Some(START_MS));
    assert!(!engine.has_changes());
}

#[test]
fn test_unknown_section_name_leaves_save_clean() {
    let (mut engine, _store, _clock) = engine();
    let state = sample_state();
    assert!(block_on(engine.save(&state, false)));
    engine.mark_changed("upgrades");
    assert!(!engine.has_changes());
    assert!(block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().clean_saves, 1);
    assert_eq!(engine.stats().incremental_saves, 0);
}

#[test]
fn test_incremental_disabled_always_saves_full() {
    let config = PersistenceConfig {
        incremental_saves: false,
        ..PersistenceConfig::default()
    };
    let (mut engine, _store, clock) = engine_with(config);
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));
    state.core.clicks += 1;
    engine.mark_changed("core");
    clock.advance(10);
    assert!(block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().full_saves, 2);
    assert_eq!(engine.stats().incremental_saves, 0);
}

#[test]
fn test_retained_snapshot_tracks_incremental_changes() {
    let (mut engine, _store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    state.inventory.add("ember", 6);
    engine.mark(Section::Inventory);
    clock.advance(5);
    assert!(block_on(engine.save(&state, false)));

    let retained = engine.retained_snapshot().unwrap();
    assert_eq!(retained.save_type, SaveType::Full);
    assert_eq!(retained.section_count(), Section::COUNT);
    assert_eq!(retained.timestamp, Some(START_MS + 5));
    let inventory = section_value(retained, Section::Inventory).unwrap();
    assert_eq!(inventory["items"][0][1], 20);
}

#[test]
fn test_incremental_accumulates_since_last_full() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    state.core.clicks = 999;
    engine.mark_changed("core");
    clock.advance(10);
    assert!(block_on(engine.save(&state, false)));

    state.lore.discovered.insert("cellar".into());
    engine.mark_changed("lore");
    clock.advance(10);
    assert!(block_on(engine.save(&state, false)));

    let primary = decode(&stored(&store, &engine.config().primary_key));
    assert_eq!(primary.changes, vec![Section::Core, Section::Lore]);

    // A full save starts a new accumulation.
    clock.advance(10);
    assert!(block_on(engine.force_full_save(&state)));
    state.buffs.cooldowns.clear();
    engine.mark_changed("buffs");
    clock.advance(10);
    assert!(block_on(engine.save(&state, false)));
    let primary = decode(&stored(&store, &engine.config().primary_key));
    assert_eq!(primary.changes, vec![Section::Buffs]);
}

#[test]
fn test_incremental_chain_survives_restart() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    state.core.clicks = 1_234;
    engine.mark_changed("core");
    clock.advance(HOUR);
    assert!(block_on(engine.save(&state, false)));

    state.inventory.add("crystal", 2);
    engine.mark_changed("inventory");
    clock.advance(HOUR);
    assert!(block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().incremental_saves, 2);

    clock.advance(HOUR);
    let mut fresh = reopen(&store, &clock);
    let mut loaded = GameState::default();
    assert!(block_on(fresh.load(&mut loaded)));

    assert_eq!(loaded.core, state.core);
    assert_eq!(loaded.inventory, state.inventory);
    assert_eq!(loaded.lore, state.lore);
    assert_eq!(loaded.meta, state.meta);
    // Idle time runs from the incremental's timestamp.
    assert_eq!(fresh.idle_time_info().idle_time_hours, 1.0);

    // The reloaded engine keeps building on the same base.
    state.lore.read.insert("tower".into());
    fresh.mark_changed("lore");
    clock.advance(10);
    assert!(block_on(fresh.save(&state, false)));
    let primary = decode(&stored(&store, &fresh.config().primary_key));
    assert_eq!(primary.save_type, SaveType::Incremental);
    assert_eq!(
        primary.changes,
        vec![Section::Core, Section::Lore, Section::Inventory]
    );
}

#[test]
fn test_new_game_forces_full_save() {
    let (mut engine, _store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    state.set_defaults();
    engine.start_new_game();
    assert!(engine.has_changes());
    assert!(engine.retained_snapshot().is_none());
    clock.advance(10);
    assert!(block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().full_saves, 2);
    assert_eq!(engine.stats().clean_saves, 0);
}
