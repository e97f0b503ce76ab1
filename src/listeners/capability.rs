//! Emitter capability shapes and per-call capability resolution

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::Listener;

/// Error type for listener registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// The emitter exposes neither supported subscribe/unsubscribe protocol
    #[error(
        "cannot {operation}: emitter '{emitter}' supports neither add/remove-event-listener nor add/remove-listener protocols"
    )]
    Capability {
        /// "register" or "unregister"
        operation: &'static str,
        /// Label of the offending emitter
        emitter: String,
    },
}

impl ListenerError {
    /// Returns true if this is a capability error
    pub fn is_capability(&self) -> bool {
        matches!(self, ListenerError::Capability { .. })
    }
}

/// Window/document-style subscription protocol
pub trait TargetStyle: Send + Sync {
    fn add_event_listener(&self, event_type: &str, listener: Listener);
    fn remove_event_listener(&self, event_type: &str, listener: &Listener);
}

/// Node-style subscription protocol
pub trait EmitterStyle: Send + Sync {
    fn add_listener(&self, event_name: &str, listener: Listener);
    fn remove_listener(&self, event_name: &str, listener: &Listener);
}

/// Anything the registry can bind listeners on.
///
/// Implementors advertise which protocol they speak by overriding one of the
/// probes. An emitter that overrides neither is rejected by the registry.
pub trait Emitter: Send + Sync {
    /// Name used in logs and snapshots
    fn label(&self) -> String {
        "emitter".to_string()
    }

    fn as_target(&self) -> Option<&dyn TargetStyle> {
        None
    }

    fn as_emitter(&self) -> Option<&dyn EmitterStyle> {
        None
    }
}

/// Which protocol an emitter was resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Target,
    Emitter,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Target => write!(f, "target"),
            Capability::Emitter => write!(f, "emitter"),
        }
    }
}

/// The protocol resolved for a single registry call
#[derive(Clone, Copy)]
pub(crate) enum Protocol<'a> {
    Target(&'a dyn TargetStyle),
    Emitter(&'a dyn EmitterStyle),
}

impl<'a> Protocol<'a> {
    /// Resolve the protocol an emitter speaks; target-style wins when both are exposed
    pub(crate) fn resolve(
        emitter: &'a dyn Emitter,
        operation: &'static str,
    ) -> Result<Self, ListenerError> {
        if let Some(target) = emitter.as_target() {
            return Ok(Protocol::Target(target));
        }
        if let Some(emitter_style) = emitter.as_emitter() {
            return Ok(Protocol::Emitter(emitter_style));
        }

        Err(ListenerError::Capability {
            operation,
            emitter: emitter.label(),
        })
    }

    pub(crate) fn capability(&self) -> Capability {
        match self {
            Protocol::Target(_) => Capability::Target,
            Protocol::Emitter(_) => Capability::Emitter,
        }
    }

    pub(crate) fn subscribe(&self, event_name: &str, listener: Listener) {
        match self {
            Protocol::Target(target) => target.add_event_listener(event_name, listener),
            Protocol::Emitter(emitter) => emitter.add_listener(event_name, listener),
        }
    }

    pub(crate) fn unsubscribe(&self, event_name: &str, listener: &Listener) {
        match self {
            Protocol::Target(target) => target.remove_event_listener(event_name, listener),
            Protocol::Emitter(emitter) => emitter.remove_listener(event_name, listener),
        }
    }
}
