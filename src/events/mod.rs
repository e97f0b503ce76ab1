use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod emitter;
pub mod target;

pub use emitter::EventEmitter;
pub use target::EventTarget;

/// An event delivered to listeners by an emitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Name of the event channel (e.g., "resize", "visibilitychange")
    event_type: String,
    /// Arbitrary JSON payload with event details
    payload: Value,
    /// Timestamp when the event was created
    timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: &str, payload: Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Create an event with a `null` payload
    pub fn named(event_type: &str) -> Self {
        Self::new(event_type, Value::Null)
    }

    /// Get the event type
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Get the payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Get the timestamp
    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }
}

/// Shared callback handle installed on an emitter.
///
/// Emitters compare listeners by pointer identity, so removal needs the very
/// handle that was added. Clone the `Arc`, never re-wrap the closure.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Wrap a closure into a [`Listener`]
pub fn listener<F>(callback: F) -> Listener
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Returns true if both handles point at the same callback allocation
pub fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable pointers may differ across codegen units
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
