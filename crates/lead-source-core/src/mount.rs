use crate::environment::CaptureEnvironment;
use crate::lead_source::{CaptureOutcome, LeadSource};
use crate::options::CaptureOptions;
use crate::store::LeadSourceStore;

/// Runs the capture gate once per mounted view.
///
/// Options are fixed when the guard is created; re-renders that call
/// [`CaptureOnMount::on_mount`] again get the first outcome back without
/// touching storage.
#[derive(Debug, Clone)]
pub struct CaptureOnMount {
    options: CaptureOptions,
    outcome: Option<CaptureOutcome>,
}

impl CaptureOnMount {
    #[must_use]
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            options,
            outcome: None,
        }
    }

    pub fn on_mount<E, S>(&mut self, source: &LeadSource<E, S>) -> CaptureOutcome
    where
        E: CaptureEnvironment,
        S: LeadSourceStore,
    {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        let outcome = source.capture(&self.options);
        self.outcome = Some(outcome);
        outcome
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    pub fn outcome(&self) -> Option<CaptureOutcome> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SnapshotEnvironment;
    use crate::notifier::LeadSourceNotifier;
    use crate::store::MemoryStore;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn repeated_mount_calls_write_once() {
        let store = MemoryStore::new();
        let leads = LeadSource::new(
            SnapshotEnvironment::from_url("https://a.example/?utm_source=x").expect("valid url"),
            store.clone(),
            LeadSourceNotifier::new(),
        );
        let writes = Rc::new(Cell::new(0));
        let _subscription = {
            let writes = Rc::clone(&writes);
            leads.subscribe(move || writes.set(writes.get() + 1))
        };

        let mut guard = CaptureOnMount::new(CaptureOptions::default().with_overwrite(true));
        assert_eq!(guard.outcome(), None);
        for _ in 0..3 {
            assert_eq!(guard.on_mount(&leads), CaptureOutcome::Written);
        }
        assert_eq!(writes.get(), 1);
        assert_eq!(guard.outcome(), Some(CaptureOutcome::Written));
    }

    #[test]
    fn options_are_fixed_at_construction() {
        let mut options = CaptureOptions::default().with_storage_key("campaign_a");
        let guard = CaptureOnMount::new(options.clone());
        options.storage_key = "campaign_b".to_string();
        assert_eq!(guard.options().storage_key, "campaign_a");
    }
}
