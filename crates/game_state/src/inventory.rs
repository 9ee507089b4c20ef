use std::collections::{HashMap, HashSet};

/// Items held by the player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    /// Item id -> quantity.
    pub items: HashMap<String, u64>,
    /// Ids of equipped items.
    pub equipped: HashSet<String>,
}

impl Inventory {
    pub fn add(&mut self, id: &str, quantity: u64) {
        *self.items.entry(id.to_string()).or_insert(0) += quantity;
    }

    pub fn quantity(&self, id: &str) -> u64 {
        self.items.get(id).copied().unwrap_or(0)
    }
}
