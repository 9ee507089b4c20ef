//! Timed buffs and ability cooldowns.

use std::collections::HashMap;

/// A temporary production multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveBuff {
    pub id: String,
    pub multiplier: f64,
    /// Milliseconds of effect left.
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuffState {
    /// Active buffs in activation order.
    pub active: Vec<ActiveBuff>,
    /// Ability id -> milliseconds until it can be used again.
    pub cooldowns: HashMap<String, u64>,
}

impl BuffState {
    /// Product of all active multipliers (1.0 when nothing is active).
    pub fn combined_multiplier(&self) -> f64 {
        self.active.iter().map(|b| b.multiplier).product()
    }
}
