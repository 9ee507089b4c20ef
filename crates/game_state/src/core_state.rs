//! Core progression: currency, clicks, level, purchased upgrades.

use std::collections::HashMap;

/// Starting essence for a fresh game.
pub const STARTING_ESSENCE: f64 = 0.0;

/// Starting level for a fresh game.
pub const STARTING_LEVEL: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct CoreState {
    /// Spendable currency.
    pub essence: f64,
    /// Lifetime essence earned (never decreases on spend).
    pub total_essence: f64,
    pub clicks: u64,
    pub level: u32,
    pub prestige_count: u32,
    /// Upgrade id -> purchased level.
    pub upgrades: HashMap<String, u32>,
    /// Wall-clock ms when this game was started, if known.
    pub created_at: Option<u64>,
}

impl Default for CoreState {
    fn default() -> Self {
        Self {
            essence: STARTING_ESSENCE,
            total_essence: STARTING_ESSENCE,
            clicks: 0,
            level: STARTING_LEVEL,
            prestige_count: 0,
            upgrades: HashMap::new(),
            created_at: None,
        }
    }
}

impl CoreState {
    /// Credit essence to both the spendable and the lifetime totals.
    pub fn earn(&mut self, amount: f64) {
        self.essence += amount;
        self.total_essence += amount;
    }

    /// Purchased level of an upgrade (0 when never bought).
    pub fn upgrade_level(&self, id: &str) -> u32 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }
}
