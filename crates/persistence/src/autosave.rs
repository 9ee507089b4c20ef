//! Periodic autosave.
//!
//! The timer accumulates real (unpaused, unclamped) time and raises a
//! non-forced `SaveGameEvent` every `interval_secs`. The engine then picks
//! an incremental, full or clean save as for any other save request.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::save_plugin::SaveGameEvent;

// =============================================================================
// Constants
// =============================================================================

/// Default autosave interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: f32 = 30.0;

// =============================================================================
// Resources
// =============================================================================

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Seconds between autosaves. Non-positive values never fire.
    pub interval_secs: f32,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
        }
    }
}

/// Seconds accumulated since the last autosave.
#[derive(Resource, Debug, Default)]
pub struct AutosaveTimer {
    pub elapsed_secs: f32,
}

impl AutosaveTimer {
    /// Advance by `delta_secs`. Returns true when an autosave is due; the
    /// timer then restarts from zero.
    pub fn tick(&mut self, delta_secs: f32, config: &AutosaveConfig) -> bool {
        if !config.enabled || config.interval_secs <= 0.0 {
            self.elapsed_secs = 0.0;
            return false;
        }

        self.elapsed_secs += delta_secs.max(0.0);
        if self.elapsed_secs >= config.interval_secs {
            self.elapsed_secs = 0.0;
            return true;
        }
        false
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Ticks the autosave timer with real time, so a paused game still autosaves.
pub fn autosave_tick_system(
    time: Res<Time<Real>>,
    config: Res<AutosaveConfig>,
    mut timer: ResMut<AutosaveTimer>,
    mut save_events: EventWriter<SaveGameEvent>,
) {
    if timer.tick(time.delta_secs(), &config) {
        debug!("Autosave due after {:.0}s", config.interval_secs);
        save_events.send(SaveGameEvent { force_full: false });
    }
}
