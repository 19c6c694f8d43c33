use lead_source_core::CaptureOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CaptureDiagnostics {
    pub(crate) phase: String,
    pub(crate) storage_available: bool,
    pub(crate) captures_total: u64,
    pub(crate) writes_total: u64,
    pub(crate) last_outcome: Option<String>,
    pub(crate) last_storage_key: Option<String>,
    pub(crate) active_watches: usize,
    pub(crate) storage_events: u64,
    pub(crate) last_error: Option<String>,
}

impl Default for CaptureDiagnostics {
    fn default() -> Self {
        Self {
            phase: "idle".to_string(),
            storage_available: false,
            captures_total: 0,
            writes_total: 0,
            last_outcome: None,
            last_storage_key: None,
            active_watches: 0,
            storage_events: 0,
            last_error: None,
        }
    }
}

impl CaptureDiagnostics {
    pub(crate) fn record_capture(&mut self, storage_key: &str, outcome: CaptureOutcome) {
        self.captures_total = self.captures_total.saturating_add(1);
        if outcome.wrote() {
            self.writes_total = self.writes_total.saturating_add(1);
        }
        self.last_outcome = Some(outcome.as_str().to_string());
        self.last_storage_key = Some(storage_key.to_string());
        self.last_error = match outcome {
            CaptureOutcome::WriteFailed => Some(format!("write to {storage_key} failed")),
            CaptureOutcome::SerializeFailed => {
                Some(format!("record for {storage_key} failed to serialize"))
            }
            _ => None,
        };
    }

    pub(crate) fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            "{\"phase\":\"error\",\"last_error\":\"diagnostics serialization failed\"}".to_string()
        })
    }
}

/// How a `storage` event from another tab is handled locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StorageEventAction {
    /// Drop cached reads only; nobody watches the key.
    Invalidate,
    /// Drop cached reads and run watch callbacks.
    Notify,
}

/// A null key means the other tab called `localStorage.clear()`.
pub(crate) fn storage_event_action<'a>(
    event_key: Option<&str>,
    mut watched_keys: impl Iterator<Item = &'a str>,
) -> StorageEventAction {
    match event_key {
        None => StorageEventAction::Notify,
        Some(key) if watched_keys.any(|watched| watched == key) => StorageEventAction::Notify,
        Some(_) => StorageEventAction::Invalidate,
    }
}
