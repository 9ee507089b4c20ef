use std::collections::{HashMap, HashSet};

// =============================================================================
// Achievement log
// =============================================================================

/// Unlocked achievements plus partial progress toward locked ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementLog {
    pub unlocked: HashSet<String>,
    /// Achievement id -> progress value (meaning is achievement-specific).
    pub progress: HashMap<String, f64>,
}

impl AchievementLog {
    /// Unlock an achievement. Returns `true` when it was newly unlocked.
    pub fn unlock(&mut self, id: &str) -> bool {
        self.progress.remove(id);
        self.unlocked.insert(id.to_string())
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }
}
