//! # Snapshot notification facility.
//!
//! [`SnapshotHub`] is the observer registry a monitored source uses to
//! announce metrics snapshots. It replaces the event-emitter idiom of other
//! runtimes with an explicit registration interface: handlers subscribe and
//! receive a [`SubscriptionId`] they (or anyone holding the id) can later
//! pass to [`SnapshotHub::unsubscribe`].
//!
//! ## Architecture
//! ```text
//! Source (one):                       Handlers (many):
//!                                  ┌──► handler 1 (id=0)
//!   source.snapshots().emit(&s) ───┼──► handler 2 (id=1)
//!                                  └──► handler N (id=n)
//! ```
//!
//! ## Rules
//! - **Multi-subscriber**: any number of handlers may be registered at once.
//! - **Synchronous dispatch**: `emit()` invokes every handler on the calling
//!   thread, in registration order, before returning. Handlers must be
//!   bounded and non-blocking.
//! - **Re-entrancy**: a handler may subscribe or unsubscribe (including
//!   itself) while an emission is in flight; registry changes take effect
//!   for the *next* emission, not the one currently dispatching.
//! - **No payload retention**: the snapshot is borrowed for the duration of
//!   one dispatch and never stored.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sources::source::Snapshot;

/// Identifies one registered snapshot handler.
///
/// Returned by [`SnapshotHub::subscribe`]; passed back into every handler
/// invocation so a handler can unregister itself mid-notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(SubscriptionId, &Snapshot) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

/// Observer registry for the snapshot events of one source.
///
/// Owned by the source; the aggregator only borrows it long enough to
/// register or remove a handler. Dispatch is serialized behind a mutex, but
/// handlers run outside the lock so they may freely call back into the hub.
#[derive(Default)]
pub struct SnapshotHub {
    inner: Mutex<HubInner>,
}

impl SnapshotHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for subsequent snapshot emissions.
    ///
    /// The handler receives its own [`SubscriptionId`] on every invocation
    /// together with the borrowed snapshot payload.
    pub fn subscribe(
        &self,
        handler: impl Fn(SubscriptionId, &Snapshot) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Removes a previously registered handler.
    ///
    /// Returns `true` if the handler was still registered. Unknown or
    /// already-removed ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.handlers.len();
        inner.handlers.retain(|(hid, _)| *hid != id);
        inner.handlers.len() != before
    }

    /// Delivers one snapshot to every currently registered handler.
    ///
    /// The handler list is captured under the lock and invoked outside it,
    /// so a handler unregistering itself (or another handler) does not
    /// deadlock; it also means a handler removed during this dispatch still
    /// observes the in-flight snapshot.
    pub fn emit(&self, snapshot: &Snapshot) {
        let handlers: Vec<(SubscriptionId, Handler)> = self.lock().handlers.clone();
        for (id, handler) in handlers {
            (*handler)(id, snapshot);
        }
    }

    /// Returns the number of currently registered handlers.
    pub fn handler_count(&self) -> usize {
        self.lock().handlers.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        // A panicking handler cannot poison the registry: dispatch happens
        // outside the lock, so recovery here only covers subscribe races.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SnapshotHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotHub")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    fn snapshot() -> Snapshot {
        json!({ "successes": 1 }).as_object().expect("object").clone()
    }

    #[test]
    fn test_emit_reaches_every_handler() {
        let hub = SnapshotHub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            hub.subscribe(move |_, _| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        hub.emit(&snapshot());
        hub.emit(&snapshot());
        assert_eq!(hits.load(Ordering::SeqCst), 6);
        assert_eq!(hub.handler_count(), 3);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = SnapshotHub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_for_handler = Arc::clone(&hits);
        let id = hub.subscribe(move |_, _| {
            hits_for_handler.fetch_add(1, Ordering::SeqCst);
        });

        hub.emit(&snapshot());
        assert!(hub.unsubscribe(id));
        hub.emit(&snapshot());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.handler_count(), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_id_is_noop() {
        let hub = SnapshotHub::new();
        let id = hub.subscribe(|_, _| {});
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
    }

    #[test]
    fn test_handler_can_unsubscribe_itself_mid_emit() {
        let hub = Arc::new(SnapshotHub::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let hub_for_handler = Arc::clone(&hub);
        let hits_for_handler = Arc::clone(&hits);
        hub.subscribe(move |id, _| {
            hits_for_handler.fetch_add(1, Ordering::SeqCst);
            hub_for_handler.unsubscribe(id);
        });

        hub.emit(&snapshot());
        hub.emit(&snapshot());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.handler_count(), 0);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let hub = SnapshotHub::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            hub.subscribe(move |_, _| {
                order.lock().expect("order lock").push(tag);
            });
        }

        hub.emit(&snapshot());
        assert_eq!(
            *order.lock().expect("order lock"),
            vec!["first", "second", "third"]
        );
    }
}
