//! Hired assistants that generate essence over time.

use std::collections::HashMap;

/// Ownership record for one assistant type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantState {
    pub count: u32,
    pub level: u32,
    /// Lifetime essence produced by this assistant type.
    pub total_produced: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantRoster {
    /// Assistant id -> ownership record.
    pub owned: HashMap<String, AssistantState>,
}

impl AssistantRoster {
    /// Total number of assistants across all types.
    pub fn total_count(&self) -> u32 {
        self.owned.values().map(|a| a.count).sum()
    }

    /// Add `count` assistants of `id`, creating the record on first hire.
    pub fn hire(&mut self, id: &str, count: u32) {
        self.owned.entry(id.to_string()).or_default().count += count;
    }
}
