use futures_lite::future::block_on;
use game_state::{GameState, Node};

use super::test_support::*;
use crate::save_types::SaveType;
use crate::serializer::{CIRCULAR_SENTINEL, DEPTH_SENTINEL, MAX_SECTION_DEPTH};

#[test]
fn test_save_then_load_restores_every_section() {
    let (mut engine, store, clock) = engine();
    let state = sample_state();
    assert!(block_on(engine.save(&state, false)));

    let mut fresh = reopen(&store, &clock);
    let mut loaded = GameState::default();
    assert!(block_on(fresh.load(&mut loaded)));

    assert_eq!(loaded.core, state.core);
    assert_eq!(loaded.assistants, state.assistants);
    assert_eq!(loaded.achievements, state.achievements);
    assert_eq!(loaded.lore, state.lore);
    assert_eq!(loaded.buffs, state.buffs);
    assert_eq!(loaded.inventory, state.inventory);
    assert_eq!(loaded.meta, state.meta);
    assert_eq!(fresh.stats().load_count, 1);
    assert_eq!(fresh.stats().last_load_loaded, Some(true));
}

#[test]
fn test_first_save_is_full_without_backup() {
    let (mut engine, store, _clock) = engine();
    assert!(block_on(engine.save(&sample_state(), false)));

    let primary = stored(&store, &engine.config().primary_key);
    assert_eq!(decode(&primary).save_type, SaveType::Full);
    assert!(engine.list_backups().is_empty());
    assert_eq!(engine.stats().full_saves, 1);
    assert!(engine.retained_snapshot().is_some());
}

#[test]
fn test_repeated_save_is_clean_and_creates_no_backup() {
    let (mut engine, _store, clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.save(&state, false)));
    state.core.clicks += 1;
    engine.mark_changed("core");
    clock.advance(1_000);
    assert!(block_on(engine.force_full_save(&state)));
    assert_eq!(engine.list_backups().len(), 1);

    assert!(!engine.has_changes());
    clock.advance(1_000);
    assert!(block_on(engine.save(&state, false)));
    assert!(!engine.has_changes());
    assert_eq!(engine.list_backups().len(), 1);
    assert_eq!(engine.stats().clean_saves, 1);
    assert_eq!(engine.stats().backups_created, 1);
}

#[test]
fn test_stats_track_sizes_and_ratio() {
    let (mut engine, _store, _clock) = engine();
    assert!(block_on(engine.save(&sample_state(), false)));
    let stats = engine.stats();
    assert_eq!(stats.save_count, 1);
    assert!(stats.last_compressed_len > 0);
    assert!(stats.last_compressed_len < stats.last_uncompressed_len);
    assert!(stats.last_compression_ratio > 0.0 && stats.last_compression_ratio < 1.0);
    assert!(stats.total_save_ms >= 0.0);

    engine.reset_stats();
    assert_eq!(engine.stats().save_count, 0);
}

#[test]
fn test_self_referencing_extension_saves_with_sentinel() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    let ext = &mut state.meta.extensions;
    let root = ext.add(Node::Map(Vec::new()));
    ext.insert(root, "parent", root);
    ext.set_root(Some(root));

    assert!(block_on(engine.save(&state, false)));
    assert_eq!(engine.stats().cycles_broken, 1);

    let mut fresh = reopen(&store, &clock);
    let mut loaded = GameState::default();
    assert!(block_on(fresh.load(&mut loaded)));
    let ext = &loaded.meta.extensions;
    let parent = ext.get(ext.root().unwrap(), "parent").unwrap();
    assert_eq!(ext.node(parent), Some(&Node::Text(CIRCULAR_SENTINEL.into())));
}

#[test]
fn test_deeply_nested_extension_still_loads() {
    let (mut engine, store, clock) = engine();
    let mut state = sample_state();
    let ext = &mut state.meta.extensions;
    let mut inner = ext.add(Node::Text("bottom".into()));
    for _ in 0..200 {
        inner = ext.add(Node::List(vec![inner]));
    }
    ext.set_root(Some(inner));

    assert!(block_on(engine.save(&state, true)));
    assert_eq!(engine.stats().depth_truncated, 1);

    let mut fresh = reopen(&store, &clock);
    let mut loaded = GameState::default();
    assert!(block_on(fresh.load(&mut loaded)));
    assert_eq!(fresh.stats().last_load_loaded, Some(true));
    assert_eq!(loaded.core, state.core);
    assert_eq!(loaded.inventory, state.inventory);

    // The extension keeps its shape down to the cut.
    let ext = &loaded.meta.extensions;
    let mut cursor = ext.root().unwrap();
    let mut depth = 0;
    while let Some(Node::List(children)) = ext.node(cursor) {
        depth += 1;
        cursor = children[0];
    }
    assert!(depth < MAX_SECTION_DEPTH);
    assert_eq!(ext.node(cursor), Some(&Node::Text(DEPTH_SENTINEL.into())));
}

#[test]
fn test_idle_time_is_capped_after_long_absence() {
    let (mut engine, store, clock) = engine();
    assert!(block_on(engine.save(&sample_state(), false)));

    clock.advance(30 * HOUR);
    let mut fresh = reopen(&store, &clock);
    let mut loaded = GameState::default();
    assert!(block_on(fresh.load(&mut loaded)));

    let idle = fresh.idle_time_info();
    assert_eq!(idle.idle_time_hours, 24.0);
    assert!(idle.capped);
    assert!(idle.is_idle);
    assert_eq!(idle.original_idle_time_ms, 30 * HOUR);
    assert_eq!(loaded.idle_time, Some(idle));
}

#[test]
fn test_calculate_idle_time_follows_the_clock() {
    let (mut engine, store, clock) = engine();
    assert!(block_on(engine.save(&sample_state(), false)));
    clock.advance(HOUR);

    let mut fresh = reopen(&store, &clock);
    let mut loaded = GameState::default();
    assert!(block_on(fresh.load(&mut loaded)));
    assert_eq!(fresh.idle_time_info().idle_time_hours, 1.0);

    clock.advance(HOUR);
    assert_eq!(fresh.calculate_idle_time().idle_time_hours, 2.0);
    // The value stored at load time does not move.
    assert_eq!(fresh.idle_time_info().idle_time_hours, 1.0);
}

#[test]
fn test_no_save_gives_inactive_idle_time() {
    let (mut engine, _store, _clock) = engine();
    let mut state = sample_state();
    assert!(block_on(engine.load(&mut state)));
    assert_eq!(state, {
        let mut fresh = GameState::default();
        fresh.idle_time = Some(Default::default());
        fresh
    });
    assert!(!engine.idle_time_info().is_idle);
    assert_eq!(engine.calculate_idle_time().idle_time_ms, 0);
}
