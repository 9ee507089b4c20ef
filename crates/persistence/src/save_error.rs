// ---------------------------------------------------------------------------
// SaveError: error types for save/load operations
// ---------------------------------------------------------------------------

use std::fmt;

use crate::store::StoreError;

/// Errors that can occur inside the save/load pipeline.
///
/// None of these escape `PersistenceEngine::save` / `load`: the engine logs
/// them and turns them into a boolean outcome plus statistics. Reference
/// cycles met while serializing are not errors at all; they are replaced by a
/// sentinel and counted.
#[derive(Debug)]
pub enum SaveError {
    /// Stored text is malformed (bad envelope, checksum mismatch, invalid JSON,
    /// wrong top-level shape).
    Parse(String),
    /// The payload is a recognized but retired schema. Deliberately not
    /// migrated.
    LegacyFormat(String),
    /// The payload was written by a newer build.
    VersionMismatch { expected_max: u32, found: u32 },
    /// The store could not be read.
    StoreRead(StoreError),
    /// The store rejected a write (unavailable, quota exceeded, I/O).
    StoreWrite(StoreError),
    /// Creating or evicting a backup failed. Never blocks the triggering save.
    BackupRotation(String),
    /// Nothing stored under the requested key.
    NoData,
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Parse(msg) => write!(f, "Parse error: {msg}"),
            SaveError::LegacyFormat(msg) => write!(f, "Legacy save format: {msg}"),
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: save is v{found}, but this build only supports up to v{expected_max}"
            ),
            SaveError::StoreRead(e) => write!(f, "Store read failed: {e}"),
            SaveError::StoreWrite(e) => write!(f, "Store write failed: {e}"),
            SaveError::BackupRotation(msg) => write!(f, "Backup rotation failed: {msg}"),
            SaveError::NoData => write!(f, "No save data available to load"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::StoreRead(e) | SaveError::StoreWrite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Parse(e.to_string())
    }
}
