use lead_source_core::LeadSourceRecord;

#[cfg(target_arch = "wasm32")]
mod wasm_constants;
#[cfg(any(target_arch = "wasm32", test))]
mod wasm_state;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    use chrono::{DateTime, Utc};
    use lead_source_core::{
        CaptureEnvironment, CaptureOptions, DeviceInfo, LeadSource, LeadSourceNotifier,
        LeadSourceStore, QueryParams, StoreError, Subscription,
    };
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use crate::record_json;
    use crate::wasm_constants::*;
    use crate::wasm_state::{CaptureDiagnostics, StorageEventAction, storage_event_action};

    mod browser;
    mod storage_events;

    use browser::{BrowserEnvironment, LocalStorageStore};
    use storage_events::install_storage_event_handler;

    struct WatchEntry {
        storage_key: String,
        _subscription: Subscription,
    }

    thread_local! {
        static NOTIFIER: LeadSourceNotifier = LeadSourceNotifier::new();
        static DIAGNOSTICS: RefCell<CaptureDiagnostics> = RefCell::new(CaptureDiagnostics::default());
        static WATCHES: RefCell<HashMap<u32, WatchEntry>> = RefCell::new(HashMap::new());
        static NEXT_WATCH_ID: Cell<u32> = const { Cell::new(1) };
        static STORAGE_EVENT_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    fn notifier() -> LeadSourceNotifier {
        NOTIFIER.with(LeadSourceNotifier::clone)
    }

    fn lead_source() -> LeadSource<BrowserEnvironment, LocalStorageStore> {
        LeadSource::new(
            BrowserEnvironment::current(),
            LocalStorageStore::current(),
            notifier(),
        )
    }

    fn sync_watch_count() {
        let active = WATCHES.with(|watches| watches.borrow().len());
        DIAGNOSTICS.with(|diagnostics| diagnostics.borrow_mut().active_watches = active);
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        install_storage_event_handler();
        let storage_available = lead_source().store().is_available();
        DIAGNOSTICS.with(|diagnostics| {
            let mut diagnostics = diagnostics.borrow_mut();
            diagnostics.phase = "ready".to_string();
            diagnostics.storage_available = storage_available;
        });
    }

    /// Runs the capture gate with options given as JSON (camelCase members,
    /// all optional). Returns the outcome label. Call once per page mount.
    #[wasm_bindgen]
    pub fn capture_lead_source(options_json: String) -> String {
        let options = CaptureOptions::from_json_or_default(&options_json);
        let outcome = lead_source().capture(&options);
        DIAGNOSTICS.with(|diagnostics| {
            diagnostics
                .borrow_mut()
                .record_capture(&options.storage_key, outcome);
        });
        outcome.as_str().to_string()
    }

    #[wasm_bindgen]
    pub fn lead_source_json(storage_key: String) -> String {
        record_json(lead_source().get(&storage_key))
    }

    #[wasm_bindgen]
    pub fn clear_lead_source(storage_key: String) {
        lead_source().clear(&storage_key);
    }

    /// Calls `callback` with the record JSON (or `"null"`) after every change
    /// notification. Returns an id for [`unwatch_lead_source`].
    #[wasm_bindgen]
    pub fn watch_lead_source(storage_key: String, callback: js_sys::Function) -> u32 {
        let id = NEXT_WATCH_ID.with(|next| {
            let id = next.get();
            next.set(id.wrapping_add(1).max(1));
            id
        });

        let watched_key = storage_key.clone();
        let subscription = notifier().subscribe(move || {
            let json = record_json(lead_source().snapshot(&watched_key));
            if callback
                .call1(&JsValue::NULL, &JsValue::from_str(&json))
                .is_err()
            {
                DIAGNOSTICS.with(|diagnostics| {
                    diagnostics.borrow_mut().last_error =
                        Some(format!("watch callback for {watched_key} threw"));
                });
            }
        });

        WATCHES.with(|watches| {
            watches.borrow_mut().insert(
                id,
                WatchEntry {
                    storage_key,
                    _subscription: subscription,
                },
            );
        });
        sync_watch_count();
        id
    }

    #[wasm_bindgen]
    pub fn unwatch_lead_source(id: u32) -> bool {
        let removed = WATCHES.with(|watches| watches.borrow_mut().remove(&id));
        sync_watch_count();
        removed.is_some()
    }

    /// Cached read matching what watch callbacks receive.
    #[wasm_bindgen]
    pub fn lead_source_snapshot_json(storage_key: String) -> String {
        record_json(lead_source().snapshot(&storage_key))
    }

    #[wasm_bindgen]
    pub fn lead_source_diagnostics_json() -> String {
        DIAGNOSTICS.with(|diagnostics| diagnostics.borrow().to_json())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{
    capture_lead_source, clear_lead_source, lead_source_diagnostics_json, lead_source_json,
    lead_source_snapshot_json,
};

/// JSON handed to page scripts: the record, or `null` when there is none.
fn record_json(record: Option<LeadSourceRecord>) -> String {
    record
        .and_then(|record| record.to_json().ok())
        .unwrap_or_else(|| "null".to_string())
}

#[cfg(not(target_arch = "wasm32"))]
mod server {
    use lead_source_core::{
        CaptureOptions, EmptyEnvironment, LeadSource, LeadSourceNotifier, UnavailableStore,
    };

    use crate::record_json;

    fn lead_source() -> LeadSource<EmptyEnvironment, UnavailableStore> {
        LeadSource::new(EmptyEnvironment, UnavailableStore, LeadSourceNotifier::new())
    }

    /// Outside a browser there is no storage, so nothing is captured.
    pub fn capture_lead_source(options_json: String) -> String {
        let options = CaptureOptions::from_json_or_default(&options_json);
        lead_source().capture(&options).as_str().to_string()
    }

    pub fn lead_source_json(storage_key: String) -> String {
        record_json(lead_source().get(&storage_key))
    }

    pub fn lead_source_snapshot_json(storage_key: String) -> String {
        record_json(lead_source().snapshot(&storage_key))
    }

    pub fn clear_lead_source(storage_key: String) {
        lead_source().clear(&storage_key);
    }

    pub fn lead_source_diagnostics_json() -> String {
        "{\"phase\":\"native\",\"detail\":\"lead source capture only runs on wasm\"}".to_string()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use server::{
    capture_lead_source, clear_lead_source, lead_source_diagnostics_json, lead_source_json,
    lead_source_snapshot_json,
};
