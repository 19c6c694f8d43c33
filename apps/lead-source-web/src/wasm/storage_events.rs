use super::*;

/// Forwards `storage` events from other tabs into the local notifier so
/// watchers re-read after another tab captures or clears.
pub(super) fn install_storage_event_handler() {
    let Some(window) = web_sys::window() else {
        return;
    };

    STORAGE_EVENT_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
            handle_storage_event(event);
        }));
        if window
            .add_event_listener_with_callback(STORAGE_EVENT_NAME, callback.as_ref().unchecked_ref())
            .is_err()
        {
            DIAGNOSTICS.with(|diagnostics| {
                diagnostics.borrow_mut().last_error =
                    Some("failed to listen for storage events".to_string());
            });
            return;
        }
        *slot.borrow_mut() = Some(callback);
    });
}

fn handle_storage_event(event: web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::StorageEvent>() else {
        return;
    };
    let event_key = event.key();
    let action = WATCHES.with(|watches| {
        let watches = watches.borrow();
        storage_event_action(
            event_key.as_deref(),
            watches.values().map(|watch| watch.storage_key.as_str()),
        )
    });
    DIAGNOSTICS.with(|diagnostics| {
        let mut diagnostics = diagnostics.borrow_mut();
        diagnostics.storage_events = diagnostics.storage_events.saturating_add(1);
    });
    match action {
        StorageEventAction::Invalidate => notifier().invalidate(),
        StorageEventAction::Notify => notifier().notify(),
    }
}
