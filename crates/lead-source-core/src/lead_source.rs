use crate::environment::CaptureEnvironment;
use crate::error::{LeadSourceError, Result};
use crate::extract::extract_lead_source;
use crate::notifier::{LeadSourceNotifier, Subscription};
use crate::options::CaptureOptions;
use crate::record::LeadSourceRecord;
use crate::store::LeadSourceStore;

/// What a capture attempt did. Informational only; capture never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Written,
    /// An entry already existed and overwrite was off.
    AlreadyCaptured,
    StorageUnavailable,
    WriteFailed,
    SerializeFailed,
}

impl CaptureOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::AlreadyCaptured => "already_captured",
            Self::StorageUnavailable => "storage_unavailable",
            Self::WriteFailed => "write_failed",
            Self::SerializeFailed => "serialize_failed",
        }
    }

    #[must_use]
    pub fn wrote(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Capture gate and accessors over one environment and one store.
#[derive(Debug)]
pub struct LeadSource<E, S> {
    environment: E,
    store: S,
    notifier: LeadSourceNotifier,
}

impl<E, S> LeadSource<E, S>
where
    E: CaptureEnvironment,
    S: LeadSourceStore,
{
    pub fn new(environment: E, store: S, notifier: LeadSourceNotifier) -> Self {
        Self {
            environment,
            store,
            notifier,
        }
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &LeadSourceNotifier {
        &self.notifier
    }

    /// Extracts and stores a record under `options.storage_key` unless an
    /// entry is already there and `options.overwrite` is off.
    ///
    /// A stored entry is always replaced whole. Store failures are logged and
    /// leave the previous entry in place.
    pub fn capture(&self, options: &CaptureOptions) -> CaptureOutcome {
        match self.try_capture(options) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(
                    %error,
                    storage_key = %options.storage_key,
                    "lead source capture skipped"
                );
                match error {
                    LeadSourceError::Serialize(_) => CaptureOutcome::SerializeFailed,
                    LeadSourceError::Store(_) | LeadSourceError::Corrupt { .. } => {
                        CaptureOutcome::WriteFailed
                    }
                }
            }
        }
    }

    fn try_capture(&self, options: &CaptureOptions) -> Result<CaptureOutcome> {
        let key = options.storage_key.as_str();
        if !self.store.is_available() {
            tracing::debug!(storage_key = %key, "no durable storage, capture skipped");
            return Ok(CaptureOutcome::StorageUnavailable);
        }

        let existing = match self.store.get_item(key) {
            Ok(existing) => existing,
            Err(error) => {
                tracing::warn!(%error, storage_key = %key, "could not check existing lead source");
                None
            }
        };
        if existing.is_some() && !options.overwrite {
            tracing::debug!(storage_key = %key, "first touch already recorded");
            return Ok(CaptureOutcome::AlreadyCaptured);
        }

        let record = extract_lead_source(&self.environment, options);
        let serialized = record.to_json().map_err(LeadSourceError::Serialize)?;
        self.store.set_item(key, &serialized)?;
        tracing::debug!(
            storage_key = %key,
            overwrite = options.overwrite,
            direct = record.is_direct(),
            "lead source stored"
        );
        self.notifier.notify();
        Ok(CaptureOutcome::Written)
    }

    /// Reads the record stored under `key`, straight from storage.
    ///
    /// An entry that is not valid JSON is deleted and reported as `None`. Any
    /// valid JSON document is kept and read leniently.
    pub fn get(&self, key: &str) -> Option<LeadSourceRecord> {
        if !self.store.is_available() {
            return None;
        }
        let raw = match self.store.get_item(key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(%error, storage_key = %key, "lead source read failed");
                return None;
            }
        };
        self.decode_or_discard(key, &raw)
    }

    /// Same result as [`Self::get`], but served from the notifier's cache
    /// between change notifications.
    pub fn snapshot(&self, key: &str) -> Option<LeadSourceRecord> {
        let raw = self.notifier.read_raw(&self.store, key)?;
        self.decode_or_discard(key, &raw)
    }

    /// Removes the entry under `key` and notifies, whether or not one existed.
    pub fn clear(&self, key: &str) {
        if let Err(error) = self.store.remove_item(key) {
            tracing::warn!(%error, storage_key = %key, "lead source clear failed");
        }
        self.notifier.notify();
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        self.notifier.subscribe(listener)
    }

    /// Reactive view of `key`. `on_change` runs after every notification;
    /// [`LeadSourceWatch::current`] then reflects the new state.
    pub fn watch(
        &self,
        key: impl Into<String>,
        on_change: impl Fn() + 'static,
    ) -> LeadSourceWatch<'_, E, S> {
        LeadSourceWatch {
            source: self,
            key: key.into(),
            _subscription: self.notifier.subscribe(on_change),
        }
    }

    fn decode_or_discard(&self, key: &str, raw: &str) -> Option<LeadSourceRecord> {
        match LeadSourceRecord::from_json(raw) {
            Ok(record) => Some(record),
            Err(source) => {
                let error = LeadSourceError::Corrupt {
                    key: key.to_string(),
                    source,
                };
                tracing::warn!(%error, "discarding corrupt lead source entry");
                if let Err(error) = self.store.remove_item(key) {
                    tracing::warn!(%error, storage_key = %key, "corrupt entry removal failed");
                }
                self.notifier.invalidate();
                None
            }
        }
    }
}

/// Subscription bound to one storage key. Unsubscribes on drop.
pub struct LeadSourceWatch<'a, E, S> {
    source: &'a LeadSource<E, S>,
    key: String,
    _subscription: Subscription,
}

impl<E, S> LeadSourceWatch<'_, E, S>
where
    E: CaptureEnvironment,
    S: LeadSourceStore,
{
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn current(&self) -> Option<LeadSourceRecord> {
        self.source.snapshot(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{EmptyEnvironment, SnapshotEnvironment};
    use crate::store::{MemoryStore, UnavailableStore};
    use std::cell::Cell;
    use std::rc::Rc;

    fn source(url: &str, store: &MemoryStore) -> LeadSource<SnapshotEnvironment, MemoryStore> {
        LeadSource::new(
            SnapshotEnvironment::from_url(url).expect("valid url"),
            store.clone(),
            LeadSourceNotifier::new(),
        )
    }

    #[test]
    fn write_failure_is_swallowed_and_keeps_prior_entry() {
        let store = MemoryStore::new();
        let leads = source("https://a.example/?utm_source=first", &store);
        assert_eq!(leads.capture(&CaptureOptions::default()), CaptureOutcome::Written);

        store.reject_writes(true);
        let notified = Rc::new(Cell::new(false));
        let _subscription = {
            let notified = Rc::clone(&notified);
            leads.subscribe(move || notified.set(true))
        };
        let outcome = leads.capture(&CaptureOptions::default().with_overwrite(true));

        assert_eq!(outcome, CaptureOutcome::WriteFailed);
        assert!(!notified.get());
        assert_eq!(
            leads.get("lead_source").and_then(|r| r.utm_source),
            Some("first".to_string())
        );
    }

    #[test]
    fn unavailable_store_reads_nothing_and_skips_writes() {
        let leads = LeadSource::new(EmptyEnvironment, UnavailableStore, LeadSourceNotifier::new());
        assert_eq!(
            leads.capture(&CaptureOptions::default()),
            CaptureOutcome::StorageUnavailable
        );
        assert_eq!(leads.get("lead_source"), None);
        assert_eq!(leads.snapshot("lead_source"), None);
    }

    #[test]
    fn clear_notifies_even_without_an_entry() {
        let store = MemoryStore::new();
        let leads = source("https://a.example/", &store);
        let calls = Rc::new(Cell::new(0));
        let _subscription = {
            let calls = Rc::clone(&calls);
            leads.subscribe(move || calls.set(calls.get() + 1))
        };

        leads.clear("lead_source");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn snapshot_discards_corrupt_entry() {
        let store = MemoryStore::new();
        store.insert_raw("lead_source", "{\"utm_source\":");
        let leads = source("https://a.example/", &store);

        assert_eq!(leads.snapshot("lead_source"), None);
        assert!(!store.contains("lead_source"));
    }

    #[test]
    fn snapshot_keeps_valid_json_of_another_shape() {
        let store = MemoryStore::new();
        store.insert_raw("lead_source", "[\"legacy\",1]");
        let leads = source("https://a.example/", &store);

        assert_eq!(leads.snapshot("lead_source"), Some(LeadSourceRecord::default()));
        assert_eq!(store.raw("lead_source").as_deref(), Some("[\"legacy\",1]"));
    }

    #[test]
    fn watch_tracks_changes_for_its_key() {
        let store = MemoryStore::new();
        let leads = source("https://a.example/?utm_medium=social", &store);
        let calls = Rc::new(Cell::new(0));
        let watch = {
            let calls = Rc::clone(&calls);
            leads.watch("lead_source", move || calls.set(calls.get() + 1))
        };
        assert_eq!(watch.key(), "lead_source");
        assert_eq!(watch.current(), None);

        leads.capture(&CaptureOptions::default());
        assert_eq!(calls.get(), 1);
        assert_eq!(
            watch.current().and_then(|r| r.utm_medium),
            Some("social".to_string())
        );

        leads.clear("lead_source");
        assert_eq!(calls.get(), 2);
        assert_eq!(watch.current(), None);

        drop(watch);
        assert_eq!(leads.notifier().listener_count(), 0);
    }

    #[test]
    fn outcome_labels_are_stable() {
        assert_eq!(CaptureOutcome::Written.as_str(), "written");
        assert_eq!(CaptureOutcome::AlreadyCaptured.as_str(), "already_captured");
        assert!(CaptureOutcome::Written.wrote());
        assert!(!CaptureOutcome::WriteFailed.wrote());
    }
}
