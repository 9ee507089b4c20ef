//! Per-section dirty flags.

use game_state::Section;

/// One dirty flag per section. Purely in-memory; never touches storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    flags: [bool; Section::COUNT],
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a section dirty by name. Unknown names are ignored.
    pub fn mark_changed(&mut self, name: &str) {
        if let Some(section) = Section::from_name(name) {
            self.mark(section);
        }
    }

    pub fn mark(&mut self, section: Section) {
        self.flags[section.index()] = true;
    }

    pub fn mark_all(&mut self) {
        self.flags = [true; Section::COUNT];
    }

    pub fn is_dirty(&self, section: Section) -> bool {
        self.flags[section.index()]
    }

    pub fn has_changes(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    /// Dirty sections in canonical order.
    pub fn dirty_sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| self.is_dirty(*s))
            .collect()
    }

    pub fn reset(&mut self) {
        self.flags = [false; Section::COUNT];
    }
}
