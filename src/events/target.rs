use std::collections::BTreeMap;
use std::fmt;

use dashmap::DashMap;
use tracing::{debug, trace};

use super::{same_listener, Event, Listener};
use crate::listeners::{Emitter, TargetStyle};

/// A window/document-style event target.
///
/// Listeners are kept per event type in insertion order. Adding a handle that
/// is already attached for the same type is ignored.
pub struct EventTarget {
    /// Name used in logs and registry snapshots (e.g., "window")
    label: String,
    /// Listeners by event type
    listeners: DashMap<String, Vec<Listener>>,
}

impl EventTarget {
    /// Create a new, empty event target
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        debug!(target_label = %label, "Creating new EventTarget");

        Self {
            label,
            listeners: DashMap::new(),
        }
    }

    /// Attach a listener for an event type
    pub fn add_event_listener(&self, event_type: &str, listener: Listener) {
        let mut entry = self.listeners.entry(event_type.to_string()).or_default();
        if entry.iter().any(|existing| same_listener(existing, &listener)) {
            trace!(
                target_label = %self.label,
                event_type,
                "Listener already attached, ignoring"
            );
            return;
        }
        entry.push(listener);
    }

    /// Detach a listener; unknown handles are ignored
    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) {
        let emptied = match self.listeners.get_mut(event_type) {
            Some(mut entry) => {
                entry.retain(|existing| !same_listener(existing, listener));
                entry.is_empty()
            }
            None => false,
        };

        if emptied {
            self.listeners.remove_if(event_type, |_, list| list.is_empty());
        }
    }

    /// Invoke every listener attached for the event's type.
    ///
    /// Listeners run against a snapshot taken before the first call, so they
    /// may attach or detach listeners on this target. Returns how many ran.
    pub fn dispatch_event(&self, event: &Event) -> usize {
        let snapshot: Vec<Listener> = match self.listeners.get(event.event_type()) {
            Some(entry) => entry.clone(),
            None => return 0,
        };

        trace!(
            target_label = %self.label,
            event_type = %event.event_type(),
            listener_count = snapshot.len(),
            "Dispatching event"
        );

        for listener in &snapshot {
            listener(event);
        }

        snapshot.len()
    }

    /// Number of listeners attached for an event type
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .get(event_type)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Get the label of this target
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl TargetStyle for EventTarget {
    fn add_event_listener(&self, event_type: &str, listener: Listener) {
        EventTarget::add_event_listener(self, event_type, listener)
    }

    fn remove_event_listener(&self, event_type: &str, listener: &Listener) {
        EventTarget::remove_event_listener(self, event_type, listener)
    }
}

impl Emitter for EventTarget {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn as_target(&self) -> Option<&dyn TargetStyle> {
        Some(self)
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<String, usize> = self
            .listeners
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect();

        f.debug_struct("EventTarget")
            .field("label", &self.label)
            .field("listeners", &counts)
            .finish()
    }
}
