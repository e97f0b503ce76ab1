//! Keyed listener registry.
//!
//! The registry remembers, per emitter, which listener it installed under each
//! `(event name, listener key)` pair. Registering again under the same pair
//! detaches the previous listener before attaching the new one, and removal
//! only needs the key because the registry holds the exact handle the emitter
//! will compare against.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::capability::{Capability, Emitter, ListenerError, Protocol};
use crate::events::{same_listener, Listener};

/// Identity of an emitter: the address of the object itself.
///
/// The entry's weak handle keeps the allocation reserved, so an address
/// cannot be handed to a different emitter while its entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EmitterKey(usize);

impl EmitterKey {
    fn of(emitter: &dyn Emitter) -> Self {
        Self(emitter as *const dyn Emitter as *const () as usize)
    }
}

/// Everything the registry holds for one emitter
struct EmitterBindings {
    /// Weak handle, only used to tell whether the emitter is still alive
    handle: Weak<dyn Emitter>,
    label: String,
    capability: Capability,
    /// event name -> listener key -> listener
    events: HashMap<String, HashMap<String, Listener>>,
}

impl EmitterBindings {
    fn new(emitter: &Arc<dyn Emitter>, capability: Capability) -> Self {
        Self {
            handle: Arc::downgrade(emitter),
            label: emitter.label(),
            capability,
            events: HashMap::new(),
        }
    }

    /// True once the emitter this entry was created for has been dropped
    fn is_dropped(&self) -> bool {
        self.handle.strong_count() == 0
    }

    fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn binding_count(&self) -> usize {
        self.events.values().map(HashMap::len).sum()
    }

    fn contains(&self, event_name: &str, listener_key: &str) -> bool {
        self.events
            .get(event_name)
            .is_some_and(|keys| keys.contains_key(listener_key))
    }

    fn insert(&mut self, event_name: &str, listener_key: &str, listener: Listener) {
        self.events
            .entry(event_name.to_string())
            .or_default()
            .insert(listener_key.to_string(), listener);
    }

    /// Remove a binding, pruning the event level when it empties
    fn take(&mut self, event_name: &str, listener_key: &str) -> Option<Listener> {
        let keys = self.events.get_mut(event_name)?;
        let listener = keys.remove(listener_key)?;
        if keys.is_empty() {
            self.events.remove(event_name);
        }
        Some(listener)
    }

    /// True if another binding for `event_name` still holds `listener`
    fn holds_handle(&self, event_name: &str, listener: &Listener) -> bool {
        self.events
            .get(event_name)
            .is_some_and(|keys| keys.values().any(|bound| same_listener(bound, listener)))
    }

    fn snapshot(&self) -> EmitterSnapshot {
        EmitterSnapshot {
            label: self.label.clone(),
            capability: self.capability,
            dropped: self.is_dropped(),
            events: self
                .events
                .iter()
                .map(|(name, keys)| (name.clone(), keys.keys().cloned().collect()))
                .collect(),
        }
    }
}

/// Serialisable view of one emitter's bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterSnapshot {
    pub label: String,
    pub capability: Capability,
    /// The emitter was dropped without being unregistered
    pub dropped: bool,
    /// event name -> listener keys
    pub events: BTreeMap<String, BTreeSet<String>>,
}

/// Serialisable view of the whole registry map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub registry: String,
    /// Sorted by label
    pub emitters: Vec<EmitterSnapshot>,
}

impl RegistrySnapshot {
    /// Total number of bindings across all emitters
    pub fn binding_count(&self) -> usize {
        self.emitters
            .iter()
            .flat_map(|emitter| emitter.events.values())
            .map(BTreeSet::len)
            .sum()
    }

    /// Listener keys bound for `event_name` on every emitter labelled `label`
    pub fn keys_for(&self, label: &str, event_name: &str) -> Vec<String> {
        self.emitters
            .iter()
            .filter(|emitter| emitter.label == label)
            .filter_map(|emitter| emitter.events.get(event_name))
            .flat_map(|keys| keys.iter().cloned())
            .collect()
    }
}

/// Registry of keyed listener bindings across emitters.
///
/// Each operation holds the emitter's map entry while it talks to the
/// emitter, so concurrent calls on the same emitter are serialised. Emitter
/// implementations must not call back into the registry from their
/// add/remove methods.
pub struct ListenerRegistry {
    /// Name for this registry (used in logging)
    name: String,
    emitters: DashMap<EmitterKey, EmitterBindings>,
}

impl ListenerRegistry {
    /// Create a new listener registry
    pub fn new() -> Self {
        Self::with_name("unnamed")
    }

    /// Create a new listener registry with a name
    pub fn with_name(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(name = %name, "Creating new ListenerRegistry");

        Self {
            name,
            emitters: DashMap::new(),
        }
    }

    /// Get the name of this registry
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind `listener` on `emitter` for `event_name` under `listener_key`.
    ///
    /// A listener already bound under the same triple is detached first.
    /// The registry keeps only a weak handle to the emitter.
    pub fn register(
        &self,
        emitter: Arc<dyn Emitter>,
        event_name: &str,
        listener: Listener,
        listener_key: &str,
    ) -> Result<RegistrySnapshot, ListenerError> {
        let protocol = Protocol::resolve(emitter.as_ref(), "register")?;
        let key = EmitterKey::of(emitter.as_ref());

        {
            let mut entry = self
                .emitters
                .entry(key)
                .or_insert_with(|| EmitterBindings::new(&emitter, protocol.capability()));

            if let Some(previous) = entry.take(event_name, listener_key) {
                detach(&protocol, &entry, event_name, &previous);
                debug!(
                    registry = %self.name,
                    emitter = %entry.label,
                    event_name,
                    listener_key,
                    "Detached previous listener before rebinding"
                );
            }

            protocol.subscribe(event_name, Arc::clone(&listener));
            entry.insert(event_name, listener_key, listener);

            debug!(
                registry = %self.name,
                emitter = %entry.label,
                capability = %protocol.capability(),
                event_name,
                listener_key,
                emitter_bindings = entry.binding_count(),
                "Registered listener"
            );
        }

        Ok(self.snapshot())
    }

    /// Detach and forget the listener bound under the triple.
    ///
    /// Returns `Ok(None)` without touching anything when nothing is bound.
    pub fn unregister(
        &self,
        emitter: &dyn Emitter,
        event_name: &str,
        listener_key: &str,
    ) -> Result<Option<RegistrySnapshot>, ListenerError> {
        let protocol = Protocol::resolve(emitter, "unregister")?;
        let key = EmitterKey::of(emitter);

        let removed = match self.emitters.get_mut(&key) {
            Some(mut entry) => match entry.take(event_name, listener_key) {
                Some(listener) => {
                    detach(&protocol, &entry, event_name, &listener);
                    true
                }
                None => false,
            },
            None => false,
        };

        if !removed {
            trace!(
                registry = %self.name,
                emitter = %emitter.label(),
                event_name,
                listener_key,
                "Nothing bound, unregister is a no-op"
            );
            return Ok(None);
        }

        self.emitters.remove_if(&key, |_, entry| entry.is_empty());

        debug!(
            registry = %self.name,
            emitter = %emitter.label(),
            event_name,
            listener_key,
            "Unregistered listener"
        );

        Ok(Some(self.snapshot()))
    }

    /// Detach every listener bound on `emitter` and drop its entry.
    ///
    /// Returns how many bindings were removed.
    pub fn unregister_emitter(&self, emitter: &dyn Emitter) -> Result<usize, ListenerError> {
        let protocol = Protocol::resolve(emitter, "unregister")?;
        let key = EmitterKey::of(emitter);

        let removed = match self.emitters.get_mut(&key) {
            Some(mut entry) => {
                let count = entry.binding_count();
                let events = std::mem::take(&mut entry.events);
                for (event_name, keys) in events {
                    let mut detached: Vec<Listener> = Vec::new();
                    for listener in keys.into_values() {
                        // A target holds a shared handle once
                        if protocol.capability() == Capability::Target
                            && detached.iter().any(|done| same_listener(done, &listener))
                        {
                            continue;
                        }
                        protocol.unsubscribe(&event_name, &listener);
                        detached.push(listener);
                    }
                }
                count
            }
            None => 0,
        };

        self.emitters.remove_if(&key, |_, entry| entry.is_empty());

        if removed > 0 {
            debug!(
                registry = %self.name,
                emitter = %emitter.label(),
                removed,
                "Unregistered all listeners of emitter"
            );
        }

        Ok(removed)
    }

    /// Returns true if a listener is bound under the triple
    pub fn is_registered(&self, emitter: &dyn Emitter, event_name: &str, listener_key: &str) -> bool {
        self.emitters
            .get(&EmitterKey::of(emitter))
            .is_some_and(|entry| entry.contains(event_name, listener_key))
    }

    /// Forget every entry whose emitter has been dropped.
    ///
    /// Such entries hold no live subscriptions, but their weak handles keep
    /// the emitter's allocation reserved until they are removed. Returns how
    /// many bindings were discarded.
    pub fn prune_dropped(&self) -> usize {
        let mut discarded = 0;
        self.emitters.retain(|_, entry| {
            if !entry.is_dropped() {
                return true;
            }
            warn!(
                registry = %self.name,
                emitter = %entry.label,
                bindings = entry.binding_count(),
                "Discarding bindings of a dropped emitter"
            );
            discarded += entry.binding_count();
            false
        });
        discarded
    }

    /// Total number of bindings, including those of dropped emitters
    pub fn binding_count(&self) -> usize {
        self.emitters.iter().map(|entry| entry.binding_count()).sum()
    }

    /// Number of emitters with at least one binding
    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    /// Copy of the current map
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut emitters: Vec<EmitterSnapshot> =
            self.emitters.iter().map(|entry| entry.snapshot()).collect();
        emitters.sort_by(|a, b| a.label.cmp(&b.label));

        RegistrySnapshot {
            registry: self.name.clone(),
            emitters,
        }
    }
}

/// Unsubscribe a binding that was just taken out of `entry`.
///
/// Target-style emitters keep a single subscription per handle, so a handle
/// still bound under another key for the same event stays attached.
fn detach(protocol: &Protocol<'_>, entry: &EmitterBindings, event_name: &str, listener: &Listener) {
    if protocol.capability() == Capability::Target && entry.holds_handle(event_name, listener) {
        trace!(
            emitter = %entry.label,
            event_name,
            "Handle still bound under another key, keeping subscription"
        );
        return;
    }
    protocol.unsubscribe(event_name, listener);
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("name", &self.name)
            .field("emitters", &self.emitters.len())
            .field("bindings", &self.binding_count())
            .finish()
    }
}
