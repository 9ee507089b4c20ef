// ---------------------------------------------------------------------------
// Snapshot format version constants
// ---------------------------------------------------------------------------

/// Current snapshot format version.
/// v1 = sectioned snapshot (`_version`, `_timestamp`, seven sections), full saves only
/// v2 = `_saveType` + `_changes` (incremental saves)
///
/// A v1 snapshot has no `_saveType` and is read as a full save.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 2;

/// Top-level fields of the retired flat save schema. Their presence marks a
/// payload as legacy; it is discarded rather than migrated.
pub const RETIRED_TOP_LEVEL_FIELDS: &[&str] = &["player", "gameData", "saveVersion", "resources"];

/// Header field names.
pub const FIELD_VERSION: &str = "_version";
pub const FIELD_TIMESTAMP: &str = "_timestamp";
pub const FIELD_SAVE_TYPE: &str = "_saveType";
pub const FIELD_CHANGES: &str = "_changes";
