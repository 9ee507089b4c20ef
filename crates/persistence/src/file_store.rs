//! Directory-backed store for native builds.
//!
//! Each key is one file `<dir>/<key>.sav`. Writes use the write-rename
//! pattern: data goes to `{path}.tmp`, is flushed with `sync_all()`, then
//! renamed over the final path, so a crash mid-write leaves the previous
//! value intact.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::store::{PersistenceStore, StoreError};

const EXTENSION: &str = "sav";

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::Io(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }

    /// Remove `.tmp` files left behind by interrupted writes.
    ///
    /// Returns the number of files removed.
    pub fn clean_tmp_files(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let mut cleaned = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("tmp") {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("File store: cleaned up tmp file: {}", path.display());
                    cleaned += 1;
                }
                Err(e) => {
                    warn!(
                        "File store: failed to remove tmp file {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
        cleaned
    }
}

/// Keys map straight to file names, so only a conservative character set is
/// accepted.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Atomically writes `data` to `path` using the write-rename pattern.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            // Undecodable bytes are corruption, not an I/O failure: hand them
            // on so the envelope check rejects them.
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Ok(Some(text)),
                Err(e) => {
                    warn!("File store: '{key}' is not valid UTF-8");
                    Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        atomic_write(&path, value.as_bytes()).map_err(StoreError::from)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?;
                stem.starts_with(prefix).then(|| stem.to_string())
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}
