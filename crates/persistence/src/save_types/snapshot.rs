use std::collections::BTreeMap;

use game_state::{NodeId, Section, ValueGraph};
use serde::{Deserialize, Serialize};

use super::version::CURRENT_SNAPSHOT_VERSION;

/// Whether a snapshot carries every section or only the dirty ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveType {
    Full,
    Incremental,
}

impl SaveType {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveType::Full => "full",
            SaveType::Incremental => "incremental",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "full" => Some(SaveType::Full),
            "incremental" => Some(SaveType::Incremental),
            _ => None,
        }
    }
}

impl std::fmt::Display for SaveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit written to storage: a header plus one value-graph root per
/// contained section.
///
/// Section bodies live in the snapshot's own arena, so a snapshot is a deep
/// copy that later mutation of the live state cannot reach.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    /// Wall-clock ms at write time. Absent only in hand-edited or very old
    /// payloads.
    pub timestamp: Option<u64>,
    pub save_type: SaveType,
    /// Sections carried by an incremental snapshot, in canonical order.
    pub changes: Vec<Section>,
    pub graph: ValueGraph,
    sections: BTreeMap<Section, NodeId>,
    /// Top-level keys of a parsed payload that are neither header fields nor
    /// section names.
    pub unknown_fields: Vec<String>,
}

impl Snapshot {
    pub fn new(save_type: SaveType, timestamp: Option<u64>) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            timestamp,
            save_type,
            changes: Vec::new(),
            graph: ValueGraph::new(),
            sections: BTreeMap::new(),
            unknown_fields: Vec::new(),
        }
    }

    pub fn section(&self, section: Section) -> Option<NodeId> {
        self.sections.get(&section).copied()
    }

    pub fn has_section(&self, section: Section) -> bool {
        self.sections.contains_key(&section)
    }

    pub fn set_section(&mut self, section: Section, root: NodeId) {
        self.sections.insert(section, root);
    }

    /// Contained sections in canonical order.
    pub fn sections(&self) -> impl Iterator<Item = (Section, NodeId)> + '_ {
        self.sections.iter().map(|(s, id)| (*s, *id))
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Overwrite `sections` with the copies carried by `other` and take its
    /// timestamp. Sections `other` does not carry are left untouched.
    ///
    /// The arena is rebuilt so replaced section bodies do not accumulate.
    pub fn merge_sections(&mut self, other: &Snapshot, sections: &[Section]) {
        let mut merged = self.clone_header();
        for section in Section::ALL {
            let source = if sections.contains(&section) && other.has_section(section) {
                other
            } else {
                &*self
            };
            merged.copy_section_from(source, section);
        }
        if other.timestamp.is_some() {
            merged.timestamp = other.timestamp;
        }
        *self = merged;
    }

    fn copy_section_from(&mut self, source: &Snapshot, section: Section) {
        let Some(root) = source.section(section) else {
            return;
        };
        if let Some(copied) = self.graph.graft(&source.graph, root) {
            self.sections.insert(section, copied);
        }
    }

    /// Same header, empty body.
    fn clone_header(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            timestamp: self.timestamp,
            save_type: self.save_type,
            changes: self.changes.clone(),
            graph: ValueGraph::new(),
            sections: BTreeMap::new(),
            unknown_fields: self.unknown_fields.clone(),
        }
    }
}
