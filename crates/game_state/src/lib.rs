use bevy::prelude::*;

pub mod achievements;
pub mod assistants;
pub mod buffs;
pub mod core_state;
pub mod idle;
pub mod inventory;
pub mod lore;
pub mod meta;
pub mod section;
pub mod value_graph;

pub use achievements::AchievementLog;
pub use assistants::{AssistantRoster, AssistantState};
pub use buffs::{ActiveBuff, BuffState};
pub use core_state::CoreState;
pub use idle::IdleTimeInfo;
pub use inventory::Inventory;
pub use lore::LoreJournal;
pub use meta::MetaState;
pub use section::Section;
pub use value_graph::{Node, NodeId, ValueGraph};

// ---------------------------------------------------------------------------
// Live game state
// ---------------------------------------------------------------------------

/// The live player state the simulation mutates and the persistence engine
/// snapshots. Each field is one persistable section, except `idle_time`,
/// which only lives for the current session.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct GameState {
    pub core: CoreState,
    pub assistants: AssistantRoster,
    pub achievements: AchievementLog,
    pub lore: LoreJournal,
    pub buffs: BuffState,
    pub inventory: Inventory,
    pub meta: MetaState,
    /// Offline time computed at the last load. Session-only.
    pub idle_time: Option<IdleTimeInfo>,
}

impl GameState {
    /// Reset to a fresh game.
    pub fn set_defaults(&mut self) {
        *self = Self::default();
    }
}
