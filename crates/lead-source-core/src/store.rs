//! Durable key-value storage seam.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("durable storage is unavailable")]
    Unavailable,
    #[error("failed to read storage key {key}: {reason}")]
    Read { key: String, reason: String },
    #[error("failed to write storage key {key}: {reason}")]
    Write { key: String, reason: String },
    #[error("failed to remove storage key {key}: {reason}")]
    Remove { key: String, reason: String },
}

/// String-keyed durable storage (`localStorage` in a browser).
pub trait LeadSourceStore {
    /// `false` when no durable storage exists in this context, e.g. during
    /// server rendering. Reads then report no data and writes are skipped.
    fn is_available(&self) -> bool {
        true
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: LeadSourceStore + ?Sized> LeadSourceStore for &T {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }
}

/// Store used where no durable storage exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl LeadSourceStore for UnavailableStore {
    fn is_available(&self) -> bool {
        false
    }

    fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    fn remove_item(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory store. Clones share the same entries, like two handles onto one
/// browser storage partition.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    reject_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set_item` fail, as a full quota would.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Writes directly, bypassing quota simulation.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }
}

impl LeadSourceStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.reject_writes.get() {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let other_tab = store.clone();
        store.set_item("lead_source", "{}").expect("write");
        assert_eq!(other_tab.raw("lead_source").as_deref(), Some("{}"));
    }

    #[test]
    fn rejected_write_keeps_previous_value() {
        let store = MemoryStore::new();
        store.insert_raw("lead_source", "{\"utm_source\":\"a\"}");
        store.reject_writes(true);

        let error = store
            .set_item("lead_source", "{\"utm_source\":\"b\"}")
            .expect_err("write should fail");
        assert!(matches!(error, StoreError::Write { .. }));
        assert_eq!(
            store.raw("lead_source").as_deref(),
            Some("{\"utm_source\":\"a\"}")
        );
    }

    #[test]
    fn unavailable_store_reads_empty_and_refuses_writes() {
        let store = UnavailableStore;
        assert!(!store.is_available());
        assert_eq!(store.get_item("lead_source"), Ok(None));
        assert_eq!(
            store.set_item("lead_source", "{}"),
            Err(StoreError::Unavailable)
        );
        assert_eq!(store.remove_item("lead_source"), Ok(()));
    }
}
