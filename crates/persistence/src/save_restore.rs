// ---------------------------------------------------------------------------
// Restore: snapshot sections -> live state
// ---------------------------------------------------------------------------
//
// Each section is decoded into its save type and written field by field.
// A field missing from the payload leaves the live value alone. A section
// whose shape does not decode at all is skipped with a warning; the other
// sections still apply.

use bevy::prelude::*;
use game_state::{
    AchievementLog, ActiveBuff, AssistantRoster, AssistantState, BuffState, CoreState, GameState,
    Inventory, LoreJournal, MetaState, Section, ValueGraph,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::save_types::*;
use crate::serializer::section_value;

/// Which sections were written onto the live state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<Section>,
    /// Present in the snapshot but undecodable.
    pub skipped: Vec<Section>,
}

pub fn restore_core(core: &mut CoreState, save: SaveCore) {
    if let Some(v) = save.essence {
        core.essence = v;
    }
    if let Some(v) = save.total_essence {
        core.total_essence = v;
    }
    if let Some(v) = save.clicks {
        core.clicks = v;
    }
    if let Some(v) = save.level {
        core.level = v;
    }
    if let Some(v) = save.prestige_count {
        core.prestige_count = v;
    }
    if let Some(pairs) = save.upgrades {
        core.upgrades = pairs.into_iter().collect();
    }
    if let Some(v) = save.created_at {
        core.created_at = v;
    }
}

pub fn restore_assistants(roster: &mut AssistantRoster, save: SaveAssistants) {
    if let Some(owned) = save.owned {
        roster.owned = owned
            .into_iter()
            .map(|(id, a)| {
                (
                    id,
                    AssistantState {
                        count: a.count,
                        level: a.level,
                        total_produced: a.total_produced,
                    },
                )
            })
            .collect();
    }
}

pub fn restore_achievements(log: &mut AchievementLog, save: SaveAchievements) {
    if let Some(unlocked) = save.unlocked {
        log.unlocked = unlocked.into_iter().collect();
    }
    if let Some(progress) = save.progress {
        log.progress = progress.into_iter().collect();
    }
}

pub fn restore_lore(lore: &mut LoreJournal, save: SaveLore) {
    if let Some(discovered) = save.discovered {
        lore.discovered = discovered.into_iter().collect();
    }
    if let Some(read) = save.read {
        lore.read = read.into_iter().collect();
    }
}

pub fn restore_buffs(buffs: &mut BuffState, save: SaveBuffs) {
    if let Some(active) = save.active {
        buffs.active = active
            .into_iter()
            .map(|b| ActiveBuff {
                id: b.id,
                multiplier: b.multiplier,
                remaining_ms: b.remaining_ms,
            })
            .collect();
    }
    if let Some(cooldowns) = save.cooldowns {
        buffs.cooldowns = cooldowns.into_iter().collect();
    }
}

pub fn restore_inventory(inventory: &mut Inventory, save: SaveInventory) {
    if let Some(items) = save.items {
        inventory.items = items.into_iter().collect();
    }
    if let Some(equipped) = save.equipped {
        inventory.equipped = equipped.into_iter().collect();
    }
}

/// Restore meta fields plus the extension graph stored next to them.
pub fn restore_meta(meta: &mut MetaState, save: SaveMeta, extensions: Option<&Value>) {
    if let Some(v) = save.total_play_time_ms {
        meta.total_play_time_ms = v;
    }
    if let Some(v) = save.session_count {
        meta.session_count = v;
    }
    if let Some(v) = save.last_session_start {
        meta.last_session_start = v;
    }
    if let Some(settings) = save.settings {
        meta.settings = settings.into_iter().collect();
    }
    match extensions {
        None => {}
        Some(Value::Null) => meta.extensions = ValueGraph::new(),
        Some(value) => {
            let mut graph = ValueGraph::new();
            let root = graph.import(value);
            graph.set_root(Some(root));
            meta.extensions = graph;
        }
    }
}

fn decode<T: DeserializeOwned>(section: Section, value: Value) -> Option<T> {
    if !value.is_object() {
        warn!("Skipping section '{section}': expected an object");
        return None;
    }
    match serde_json::from_value(value) {
        Ok(save) => Some(save),
        Err(e) => {
            warn!("Skipping section '{section}': unexpected shape ({e})");
            None
        }
    }
}

/// Decode and apply one section value. Returns false if it was skipped.
pub fn apply_section(state: &mut GameState, section: Section, value: Value) -> bool {
    let restored = match section {
        Section::Core => decode(section, value).map(|s| restore_core(&mut state.core, s)),
        Section::Assistants => {
            decode(section, value).map(|s| restore_assistants(&mut state.assistants, s))
        }
        Section::Achievements => {
            decode(section, value).map(|s| restore_achievements(&mut state.achievements, s))
        }
        Section::Lore => decode(section, value).map(|s| restore_lore(&mut state.lore, s)),
        Section::Buffs => decode(section, value).map(|s| restore_buffs(&mut state.buffs, s)),
        Section::Inventory => {
            decode(section, value).map(|s| restore_inventory(&mut state.inventory, s))
        }
        Section::Meta => {
            let extensions = value.get(META_EXTENSIONS_KEY).cloned();
            decode(section, value)
                .map(|s| restore_meta(&mut state.meta, s, extensions.as_ref()))
        }
    };
    restored.is_some()
}

/// Apply every section the snapshot carries onto the live state.
pub fn apply_snapshot(state: &mut GameState, snapshot: &Snapshot) -> ApplyReport {
    let mut report = ApplyReport::default();
    for (section, _) in snapshot.sections() {
        let applied = section_value(snapshot, section)
            .is_some_and(|value| apply_section(state, section, value));
        if applied {
            report.applied.push(section);
        } else {
            report.skipped.push(section);
        }
    }
    report
}
