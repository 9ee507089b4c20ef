use std::collections::HashSet;

/// Lore fragments the player has found and read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoreJournal {
    pub discovered: HashSet<String>,
    pub read: HashSet<String>,
}

impl LoreJournal {
    /// Fragments discovered but not yet read.
    pub fn unread_count(&self) -> usize {
        self.discovered.difference(&self.read).count()
    }
}
