use std::collections::BTreeMap;
use std::fmt;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, trace};

use super::{same_listener, Event, Listener};
use crate::listeners::{Emitter, EmitterStyle};

/// A Node-style event emitter.
///
/// Unlike [`EventTarget`](super::EventTarget), the same handle may be added
/// more than once; each addition is invoked on emit.
pub struct EventEmitter {
    label: String,
    listeners: DashMap<String, Vec<Listener>>,
}

impl EventEmitter {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        debug!(emitter_label = %label, "Creating new EventEmitter");

        Self {
            label,
            listeners: DashMap::new(),
        }
    }

    /// Append a listener for an event name
    pub fn add_listener(&self, event_name: &str, listener: Listener) {
        self.listeners
            .entry(event_name.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove the most recently added occurrence of `listener`
    pub fn remove_listener(&self, event_name: &str, listener: &Listener) {
        let emptied = match self.listeners.get_mut(event_name) {
            Some(mut entry) => {
                if let Some(position) = entry.iter().rposition(|l| same_listener(l, listener)) {
                    entry.remove(position);
                }
                entry.is_empty()
            }
            None => false,
        };

        if emptied {
            self.listeners.remove_if(event_name, |_, list| list.is_empty());
        }
    }

    /// Call every listener for `event_name` with the given payload.
    ///
    /// Returns true if at least one listener ran.
    pub fn emit(&self, event_name: &str, payload: Value) -> bool {
        let snapshot: Vec<Listener> = match self.listeners.get(event_name) {
            Some(entry) => entry.clone(),
            None => return false,
        };

        trace!(
            emitter_label = %self.label,
            event_name,
            listener_count = snapshot.len(),
            "Emitting event"
        );

        let event = Event::new(event_name, payload);
        for listener in &snapshot {
            listener(&event);
        }

        !snapshot.is_empty()
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .get(event_name)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Names with at least one listener, sorted
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listeners.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl EmitterStyle for EventEmitter {
    fn add_listener(&self, event_name: &str, listener: Listener) {
        EventEmitter::add_listener(self, event_name, listener)
    }

    fn remove_listener(&self, event_name: &str, listener: &Listener) {
        EventEmitter::remove_listener(self, event_name, listener)
    }
}

impl Emitter for EventEmitter {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn as_emitter(&self) -> Option<&dyn EmitterStyle> {
        Some(self)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<String, usize> = self
            .listeners
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect();

        f.debug_struct("EventEmitter")
            .field("label", &self.label)
            .field("listeners", &counts)
            .finish()
    }
}
