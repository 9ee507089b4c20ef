// ---------------------------------------------------------------------------
// Save Stages: live state -> snapshot sections
// ---------------------------------------------------------------------------
//
// ```text
//   GameState
//     |
//     +-- collect_core_stage         -> SaveCore
//     +-- collect_assistants_stage   -> SaveAssistants
//     +-- collect_achievements_stage -> SaveAchievements
//     +-- collect_lore_stage         -> SaveLore
//     +-- collect_buffs_stage        -> SaveBuffs
//     +-- collect_inventory_stage    -> SaveInventory
//     +-- collect_meta_stage         -> SaveMeta (+ extension graph)
//     |
//     +---> build_snapshot(state, sections) -> Snapshot
// ```
//
// Every stage produces owned copies, so a built snapshot is unaffected by
// later mutation of the live state. Hash containers are emitted key-sorted so
// identical state always yields identical text.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use game_state::{
    AchievementLog, AssistantRoster, BuffState, CoreState, GameState, Inventory, LoreJournal,
    MetaState, Node, NodeId, Section, ValueGraph,
};
use serde::Serialize;

use crate::save_types::*;

fn sorted_pairs<V: Clone>(map: &HashMap<String, V>) -> Pairs<V> {
    let mut pairs: Pairs<V> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

fn sorted_members(set: &HashSet<String>) -> Vec<String> {
    let mut members: Vec<String> = set.iter().cloned().collect();
    members.sort();
    members
}

pub fn collect_core_stage(core: &CoreState) -> SaveCore {
    SaveCore {
        essence: Some(core.essence),
        total_essence: Some(core.total_essence),
        clicks: Some(core.clicks),
        level: Some(core.level),
        prestige_count: Some(core.prestige_count),
        upgrades: Some(sorted_pairs(&core.upgrades)),
        created_at: Some(core.created_at),
    }
}

pub fn collect_assistants_stage(roster: &AssistantRoster) -> SaveAssistants {
    let mut owned: Pairs<SaveAssistant> = roster
        .owned
        .iter()
        .map(|(id, a)| {
            (
                id.clone(),
                SaveAssistant {
                    count: a.count,
                    level: a.level,
                    total_produced: a.total_produced,
                },
            )
        })
        .collect();
    owned.sort_by(|a, b| a.0.cmp(&b.0));
    SaveAssistants { owned: Some(owned) }
}

pub fn collect_achievements_stage(log: &AchievementLog) -> SaveAchievements {
    SaveAchievements {
        unlocked: Some(sorted_members(&log.unlocked)),
        progress: Some(sorted_pairs(&log.progress)),
    }
}

pub fn collect_lore_stage(lore: &LoreJournal) -> SaveLore {
    SaveLore {
        discovered: Some(sorted_members(&lore.discovered)),
        read: Some(sorted_members(&lore.read)),
    }
}

pub fn collect_buffs_stage(buffs: &BuffState) -> SaveBuffs {
    SaveBuffs {
        // Activation order is meaningful; keep it.
        active: Some(
            buffs
                .active
                .iter()
                .map(|b| SaveBuff {
                    id: b.id.clone(),
                    multiplier: b.multiplier,
                    remaining_ms: b.remaining_ms,
                })
                .collect(),
        ),
        cooldowns: Some(sorted_pairs(&buffs.cooldowns)),
    }
}

pub fn collect_inventory_stage(inventory: &Inventory) -> SaveInventory {
    SaveInventory {
        items: Some(sorted_pairs(&inventory.items)),
        equipped: Some(sorted_members(&inventory.equipped)),
    }
}

pub fn collect_meta_stage(meta: &MetaState) -> SaveMeta {
    SaveMeta {
        total_play_time_ms: Some(meta.total_play_time_ms),
        session_count: Some(meta.session_count),
        last_session_start: Some(meta.last_session_start),
        settings: Some(sorted_pairs(&meta.settings)),
    }
}

/// Import a section DTO into `graph`.
fn import_stage<T: Serialize>(graph: &mut ValueGraph, section: Section, stage: &T) -> NodeId {
    match serde_json::to_value(stage) {
        Ok(value) => graph.import(&value),
        Err(e) => {
            // Only reachable with non-string map keys, which no stage emits.
            warn!("Failed to project section '{section}': {e}");
            graph.add(Node::Map(Vec::new()))
        }
    }
}

/// Build the root node of one section inside `graph`.
pub fn build_section(graph: &mut ValueGraph, state: &GameState, section: Section) -> NodeId {
    match section {
        Section::Core => import_stage(graph, section, &collect_core_stage(&state.core)),
        Section::Assistants => {
            import_stage(graph, section, &collect_assistants_stage(&state.assistants))
        }
        Section::Achievements => import_stage(
            graph,
            section,
            &collect_achievements_stage(&state.achievements),
        ),
        Section::Lore => import_stage(graph, section, &collect_lore_stage(&state.lore)),
        Section::Buffs => import_stage(graph, section, &collect_buffs_stage(&state.buffs)),
        Section::Inventory => {
            import_stage(graph, section, &collect_inventory_stage(&state.inventory))
        }
        Section::Meta => {
            let root = import_stage(graph, section, &collect_meta_stage(&state.meta));
            let extensions = &state.meta.extensions;
            // Grafted as a graph, so shared and cyclic references survive
            // until the serializer flattens them.
            let copied = extensions
                .root()
                .and_then(|ext_root| graph.graft(extensions, ext_root))
                .unwrap_or_else(|| graph.add(Node::Null));
            graph.insert(root, META_EXTENSIONS_KEY, copied);
            root
        }
    }
}

/// Capture `sections` of the live state into a new snapshot.
pub fn build_snapshot(
    state: &GameState,
    sections: &[Section],
    save_type: SaveType,
    now_ms: u64,
) -> Snapshot {
    let mut snapshot = Snapshot::new(save_type, Some(now_ms));
    for section in Section::ALL {
        if sections.contains(&section) {
            let root = build_section(&mut snapshot.graph, state, section);
            snapshot.set_section(section, root);
        }
    }
    snapshot
}

/// Capture all seven sections.
pub fn build_full_snapshot(state: &GameState, now_ms: u64) -> Snapshot {
    build_snapshot(state, &Section::ALL, SaveType::Full, now_ms)
}
