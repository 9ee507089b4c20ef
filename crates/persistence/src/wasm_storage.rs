//! `window.localStorage` backend for WASM builds.
//!
//! Snapshot payloads are compact text, so the ~5 MB localStorage budget is
//! enough for a progression save plus a few backups.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};

use crate::store::{PersistenceStore, StoreError};

#[derive(Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Result<Storage, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("localStorage error: {e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage not available".to_string()))
    }
}

/// Check whether a JsValue represents a QuotaExceededError.
fn is_quota_exceeded_error(err: &JsValue) -> bool {
    if let Ok(dom_exception) = err.clone().dyn_into::<DomException>() {
        return dom_exception.name() == "QuotaExceededError";
    }
    let s = format!("{err:?}");
    s.contains("QuotaExceededError") || s.contains("quota")
}

impl PersistenceStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StoreError::Io(format!("getItem failed: {e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?.set_item(key, value).map_err(|e| {
            if is_quota_exceeded_error(&e) {
                StoreError::QuotaExceeded
            } else {
                StoreError::Io(format!("setItem failed: {e:?}"))
            }
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StoreError::Io(format!("removeItem failed: {e:?}")))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let storage = self.storage()?;
        let len = storage
            .length()
            .map_err(|e| StoreError::Io(format!("length failed: {e:?}")))?;
        let mut keys = Vec::new();
        for i in 0..len {
            if let Ok(Some(key)) = storage.key(i) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
