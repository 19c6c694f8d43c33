//! Change notification for stored lead source entries.
//!
//! One notifier exists per execution context (browser tab). It keeps the
//! last raw value read for each storage key so repeated reactive reads do not
//! hit storage, and drops that whole cache on every [`LeadSourceNotifier::notify`]
//! before calling listeners.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::store::LeadSourceStore;

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct NotifierInner {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    cache: RefCell<HashMap<String, Option<String>>>,
}

/// Cheap to clone; clones share listeners and cache.
#[derive(Clone, Default)]
pub struct LeadSourceNotifier {
    inner: Rc<NotifierInner>,
}

impl fmt::Debug for LeadSourceNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeadSourceNotifier")
            .field("listeners", &self.listener_count())
            .field("cached_keys", &self.inner.cache.borrow().len())
            .finish()
    }
}

impl LeadSourceNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` until the returned [`Subscription`] is dropped or
    /// unsubscribed.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.wrapping_add(1));
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            notifier: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Clears the read cache, then calls every listener in registration order.
    ///
    /// Listeners added or removed while this runs take effect on the next call.
    pub fn notify(&self) {
        self.invalidate();
        let listeners = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect::<Vec<_>>();
        tracing::debug!(listeners = listeners.len(), "lead source changed");
        for listener in listeners {
            listener();
        }
    }

    /// Clears the read cache without calling listeners.
    pub fn invalidate(&self) {
        self.inner.cache.borrow_mut().clear();
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Raw value under `key`, served from the cache until the next
    /// invalidation. Unavailable storage always reads as `None` and is never
    /// cached.
    pub fn read_raw<S>(&self, store: &S, key: &str) -> Option<String>
    where
        S: LeadSourceStore + ?Sized,
    {
        if !store.is_available() {
            return None;
        }
        if let Some(cached) = self.inner.cache.borrow().get(key) {
            return cached.clone();
        }

        match store.get_item(key) {
            Ok(raw) => {
                self.inner
                    .cache
                    .borrow_mut()
                    .insert(key.to_string(), raw.clone());
                raw
            }
            Err(error) => {
                tracing::warn!(%error, storage_key = %key, "lead source read failed");
                None
            }
        }
    }
}

/// Registration handle returned by [`LeadSourceNotifier::subscribe`].
///
/// The listener is removed when this is dropped.
#[must_use = "dropping a subscription unregisters its listener"]
pub struct Subscription {
    notifier: Weak<NotifierInner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.notifier.upgrade() {
            inner
                .listeners
                .borrow_mut()
                .retain(|(id, _)| *id != self.id);
        }
    }
}
