use serde::{Deserialize, Serialize};

// =============================================================================
// Section names
// =============================================================================

/// A named, independently trackable slice of the player state.
///
/// The declaration order is the canonical order used everywhere a list of
/// sections is produced (dirty lists, snapshot layout, `_changes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Core,
    Assistants,
    Achievements,
    Lore,
    Buffs,
    Inventory,
    Meta,
}

impl Section {
    /// All sections in canonical order.
    pub const ALL: [Section; 7] = [
        Section::Core,
        Section::Assistants,
        Section::Achievements,
        Section::Lore,
        Section::Buffs,
        Section::Inventory,
        Section::Meta,
    ];

    /// Number of sections.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable name used as the snapshot key.
    pub fn name(self) -> &'static str {
        match self {
            Section::Core => "core",
            Section::Assistants => "assistants",
            Section::Achievements => "achievements",
            Section::Lore => "lore",
            Section::Buffs => "buffs",
            Section::Inventory => "inventory",
            Section::Meta => "meta",
        }
    }

    /// Parse a section name. Returns `None` for anything unrecognized.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Position in `ALL`, usable as an index into per-section arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
