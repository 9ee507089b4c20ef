use std::sync::Mutex;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::tasks::block_on;
use game_state::{GameState, Section};

use crate::autosave::{autosave_tick_system, AutosaveConfig, AutosaveTimer};
use crate::clock::SystemClock;
use crate::config::PersistenceConfig;
use crate::engine::PersistenceEngine;

/// Directory the native build keeps its save files in.
#[cfg(not(target_arch = "wasm32"))]
pub const DEFAULT_SAVE_DIR: &str = "saves";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Request a save. Several requests in one frame collapse into one save,
/// forced full if any of them asked for it.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SaveGameEvent {
    pub force_full: bool,
}

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct LoadGameEvent;

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct NewGameEvent;

/// Result of a serviced request, for UI and analytics listeners.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOutcome {
    Saved { success: bool },
    Loaded { success: bool },
    NewGameStarted,
}

// ---------------------------------------------------------------------------
// Gameplay helper
// ---------------------------------------------------------------------------

/// Lets gameplay systems flag the sections they mutate.
#[derive(SystemParam)]
pub struct ChangedSections<'w> {
    engine: ResMut<'w, PersistenceEngine>,
}

impl ChangedSections<'_> {
    pub fn mark(&mut self, section: Section) {
        self.engine.mark(section);
    }

    /// Unknown names are ignored.
    pub fn mark_changed(&mut self, name: &str) {
        self.engine.mark_changed(name);
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Installs the engine as a resource and services save/load/new-game events.
///
/// The live `GameState` resource is loaded at `Startup`.
pub struct PersistencePlugin {
    // Plugins are shared by reference, so the engine is moved out on build.
    engine: Mutex<Option<PersistenceEngine>>,
    autosave: AutosaveConfig,
}

impl PersistencePlugin {
    pub fn new(engine: PersistenceEngine) -> Self {
        Self {
            engine: Mutex::new(Some(engine)),
            autosave: AutosaveConfig::default(),
        }
    }

    pub fn with_autosave(mut self, autosave: AutosaveConfig) -> Self {
        self.autosave = autosave;
        self
    }
}

impl Default for PersistencePlugin {
    /// The platform store with the system clock and default config.
    fn default() -> Self {
        Self::new(platform_engine(PersistenceConfig::default()))
    }
}

impl Plugin for PersistencePlugin {
    fn build(&self, app: &mut App) {
        let engine = self
            .engine
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .unwrap_or_else(|| {
                warn!("PersistencePlugin built twice; using a default engine");
                platform_engine(PersistenceConfig::default())
            });

        // Read-only mirror for systems that only need the keys or limits.
        app.insert_resource(engine.config().clone())
            .insert_resource(engine)
            .insert_resource(self.autosave.clone())
            .init_resource::<AutosaveTimer>()
            .init_resource::<GameState>()
            .add_event::<SaveGameEvent>()
            .add_event::<LoadGameEvent>()
            .add_event::<NewGameEvent>()
            .add_event::<PersistenceOutcome>();

        app.add_systems(Startup, load_on_startup);

        // Autosave runs first so its request is serviced in the same frame.
        // New game and load precede save so a save never captures a state
        // that is about to be replaced.
        app.add_systems(
            Update,
            (
                autosave_tick_system,
                handle_new_game_events,
                handle_load_events,
                handle_save_events,
            )
                .chain(),
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_engine(config: PersistenceConfig) -> PersistenceEngine {
    let store = crate::file_store::FileStore::new(DEFAULT_SAVE_DIR);
    let removed = store.clean_tmp_files();
    if removed > 0 {
        info!("Removed {removed} interrupted write(s) from '{DEFAULT_SAVE_DIR}'");
    }
    PersistenceEngine::new(store, SystemClock, config)
}

#[cfg(target_arch = "wasm32")]
fn platform_engine(config: PersistenceConfig) -> PersistenceEngine {
    PersistenceEngine::new(
        crate::wasm_storage::LocalStorageStore::new(),
        SystemClock,
        config,
    )
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn load_on_startup(
    mut engine: ResMut<PersistenceEngine>,
    mut state: ResMut<GameState>,
    mut outcomes: EventWriter<PersistenceOutcome>,
) {
    let success = block_on(engine.load(&mut state));
    outcomes.send(PersistenceOutcome::Loaded { success });
}

fn handle_new_game_events(
    mut events: EventReader<NewGameEvent>,
    mut engine: ResMut<PersistenceEngine>,
    mut state: ResMut<GameState>,
    mut outcomes: EventWriter<PersistenceOutcome>,
) {
    if events.read().next().is_none() {
        return;
    }
    events.read().for_each(drop);

    state.set_defaults();
    engine.start_new_game();
    info!("Started a new game");
    outcomes.send(PersistenceOutcome::NewGameStarted);
}

fn handle_load_events(
    mut events: EventReader<LoadGameEvent>,
    mut engine: ResMut<PersistenceEngine>,
    mut state: ResMut<GameState>,
    mut outcomes: EventWriter<PersistenceOutcome>,
) {
    if events.read().next().is_none() {
        return;
    }
    events.read().for_each(drop);

    let success = block_on(engine.load(&mut state));
    outcomes.send(PersistenceOutcome::Loaded { success });
}

fn handle_save_events(
    mut events: EventReader<SaveGameEvent>,
    mut engine: ResMut<PersistenceEngine>,
    state: Res<GameState>,
    mut outcomes: EventWriter<PersistenceOutcome>,
) {
    let Some(force_full) = events
        .read()
        .map(|e| e.force_full)
        .reduce(|a, b| a || b)
    else {
        return;
    };

    let success = block_on(engine.save(&state, force_full));
    if !success {
        warn!("Save request failed; the game keeps running on unsaved state");
    }
    outcomes.send(PersistenceOutcome::Saved { success });
}
