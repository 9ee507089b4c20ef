use std::collections::HashMap;

use crate::value_graph::ValueGraph;

/// Bookkeeping about the player's sessions, settings and free-form data
/// attached by collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaState {
    pub total_play_time_ms: u64,
    pub session_count: u32,
    pub last_session_start: Option<u64>,
    /// Player preferences keyed by setting name.
    pub settings: HashMap<String, String>,
    /// Free-form data owned by collaborators. May contain shared or cyclic
    /// references.
    pub extensions: ValueGraph,
}
