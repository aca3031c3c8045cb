//! In-process listener hub.
//!
//! Registers callbacks for two independent event classes (location
//! updates, sharing-state changes) and fans out synchronously in
//! registration order. Delivery is at-most-once and fire-and-forget:
//! there is no buffering, so a callback registered after an emission
//! never sees it.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::error;

use beacon_entity::location::LocationSample;

type LocationCallback = Arc<dyn Fn(&LocationSample) + Send + Sync>;
type SharingCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Which event class a registration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerKind {
    Location,
    Sharing,
}

/// Capability to remove exactly one listener registration.
///
/// The same callback may be registered more than once; each registration
/// gets its own guard and is removable independently. Dropping the guard
/// without calling [`ListenerGuard::unsubscribe`] leaves the listener
/// registered.
pub struct ListenerGuard {
    kind: ListenerKind,
    id: u64,
    hub: Arc<ListenerHub>,
}

impl ListenerGuard {
    /// Remove the registration this guard was issued for.
    pub fn unsubscribe(self) {
        self.hub.remove(self.kind, self.id);
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

/// Listener registry for location and sharing-state events.
pub struct ListenerHub {
    /// Location listeners in registration order.
    location: Mutex<Vec<(u64, LocationCallback)>>,
    /// Sharing-state listeners in registration order.
    sharing: Mutex<Vec<(u64, SharingCallback)>>,
    /// Registration id counter.
    next_id: AtomicU64,
}

impl ListenerHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            location: Mutex::new(Vec::new()),
            sharing: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a location listener, returning its removal capability.
    pub fn on_location(
        hub: &Arc<Self>,
        cb: impl Fn(&LocationSample) + Send + Sync + 'static,
    ) -> ListenerGuard {
        let id = hub.next_id.fetch_add(1, Ordering::SeqCst);
        hub.location.lock().unwrap().push((id, Arc::new(cb)));
        ListenerGuard {
            kind: ListenerKind::Location,
            id,
            hub: Arc::clone(hub),
        }
    }

    /// Register a sharing-state listener, returning its removal capability.
    pub fn on_sharing(
        hub: &Arc<Self>,
        cb: impl Fn(bool) + Send + Sync + 'static,
    ) -> ListenerGuard {
        let id = hub.next_id.fetch_add(1, Ordering::SeqCst);
        hub.sharing.lock().unwrap().push((id, Arc::new(cb)));
        ListenerGuard {
            kind: ListenerKind::Sharing,
            id,
            hub: Arc::clone(hub),
        }
    }

    /// Fan a sample out to the location listeners registered right now.
    ///
    /// A panicking callback is isolated and logged; delivery continues
    /// with the next listener.
    pub fn emit_location(&self, sample: &LocationSample) {
        let listeners: Vec<LocationCallback> = {
            let registered = self.location.lock().unwrap();
            registered.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for cb in listeners {
            if catch_unwind(AssertUnwindSafe(|| (cb.as_ref())(sample))).is_err() {
                error!("location listener panicked; continuing fan-out");
            }
        }
    }

    /// Fan a sharing-state change out to the sharing listeners.
    pub fn emit_sharing(&self, sharing: bool) {
        let listeners: Vec<SharingCallback> = {
            let registered = self.sharing.lock().unwrap();
            registered.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for cb in listeners {
            if catch_unwind(AssertUnwindSafe(|| (cb.as_ref())(sharing))).is_err() {
                error!("sharing listener panicked; continuing fan-out");
            }
        }
    }

    /// Remove one registration by id.
    fn remove(&self, kind: ListenerKind, id: u64) {
        match kind {
            ListenerKind::Location => self.location.lock().unwrap().retain(|(i, _)| *i != id),
            ListenerKind::Sharing => self.sharing.lock().unwrap().retain(|(i, _)| *i != id),
        }
    }
}

impl Default for ListenerHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHub")
            .field("location_listeners", &self.location.lock().unwrap().len())
            .field("sharing_listeners", &self.sharing.lock().unwrap().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LocationSample {
        LocationSample {
            latitude: 1.0,
            longitude: 2.0,
            accuracy_m: None,
            heading_deg: None,
            speed_mps: None,
            timestamp_ms: 1,
        }
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let hub = Arc::new(ListenerHub::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            ListenerHub::on_sharing(&hub, move |_| seen.lock().unwrap().push(tag));
        }
        hub.emit_sharing(true);
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribed_listener_is_not_invoked() {
        let hub = Arc::new(ListenerHub::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        let guard_a = ListenerHub::on_location(&hub, move |_| seen_a.lock().unwrap().push("a"));
        let seen_b = Arc::clone(&seen);
        let _guard_b = ListenerHub::on_location(&hub, move |_| seen_b.lock().unwrap().push("b"));

        guard_a.unsubscribe();
        hub.emit_location(&sample());
        assert_eq!(*seen.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_double_registration_removable_independently() {
        let hub = Arc::new(ListenerHub::new());
        let count = Arc::new(Mutex::new(0u32));

        let cb = {
            let count = Arc::clone(&count);
            Arc::new(move |_: &LocationSample| *count.lock().unwrap() += 1)
        };
        let cb2 = Arc::clone(&cb);
        let guard1 = ListenerHub::on_location(&hub, move |s| (cb.as_ref())(s));
        let _guard2 = ListenerHub::on_location(&hub, move |s| (cb2.as_ref())(s));

        guard1.unsubscribe();
        hub.emit_location(&sample());
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_block_delivery() {
        let hub = Arc::new(ListenerHub::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        ListenerHub::on_sharing(&hub, |_| panic!("listener bug"));
        let seen_b = Arc::clone(&seen);
        ListenerHub::on_sharing(&hub, move |v| seen_b.lock().unwrap().push(v));

        hub.emit_sharing(false);
        assert_eq!(*seen.lock().unwrap(), vec![false]);
    }

    #[test]
    fn test_no_buffering_for_late_registration() {
        let hub = Arc::new(ListenerHub::new());
        hub.emit_sharing(true);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        ListenerHub::on_sharing(&hub, move |v| seen_cb.lock().unwrap().push(v));
        assert!(seen.lock().unwrap().is_empty());
    }
}
