use serde::{Deserialize, Serialize};

/// Offline time between the last save and the current load.
///
/// Computed once per load and kept for the current session only; it is never
/// written back to storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleTimeInfo {
    /// Elapsed time, capped at the configured maximum.
    pub idle_time_ms: u64,
    /// Elapsed time before capping.
    pub original_idle_time_ms: u64,
    pub idle_time_hours: f64,
    pub idle_time_days: f64,
    /// Whether the uncapped elapsed time exceeded the idle threshold.
    pub is_idle: bool,
    /// Whether the elapsed time was cut down to the maximum.
    pub capped: bool,
}
