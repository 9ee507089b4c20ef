//! Offline-time calculation.
//!
//! Pure: the caller stores the result and decides what any idle bonus is
//! worth.

use game_state::IdleTimeInfo;

use crate::config::IdleConfig;

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Compute idle time between `saved_timestamp` and `now_ms`.
///
/// - No saved timestamp: zero, not idle, not capped.
/// - A saved timestamp in the future (clock skew) counts as zero elapsed.
/// - The idle threshold is tested against the *uncapped* elapsed time.
pub fn compute(saved_timestamp: Option<u64>, now_ms: u64, config: &IdleConfig) -> IdleTimeInfo {
    let Some(saved) = saved_timestamp else {
        return IdleTimeInfo::default();
    };

    let original = now_ms.saturating_sub(saved);
    let idle = original.min(config.max_idle_ms);

    IdleTimeInfo {
        idle_time_ms: idle,
        original_idle_time_ms: original,
        idle_time_hours: idle as f64 / MS_PER_HOUR,
        idle_time_days: idle as f64 / MS_PER_DAY,
        is_idle: original > config.idle_threshold_ms,
        capped: original > config.max_idle_ms,
    }
}
