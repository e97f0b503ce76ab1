//! Recording listeners and emitter fixtures shared by the integration tests
use std::sync::{Arc, Mutex};

use pagekit::{listener, Emitter, Event, EventEmitter, EventTarget, Listener, ListenerRegistry};

/// Collects every event delivered to the listeners it hands out
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that records `(tag, event type)` on each call
    pub fn listener(&self, tag: &str) -> Listener {
        let calls = self.calls.clone();
        let tag = tag.to_string();
        listener(move |event: &Event| {
            calls
                .lock()
                .unwrap()
                .push((tag.clone(), event.event_type().to_string()));
        })
    }

    pub fn tags(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    pub fn count(&self, tag: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == tag)
            .count()
    }
}

/// Registry plus one emitter of each style
pub struct TestEnvironment {
    pub registry: ListenerRegistry,
    pub window: Arc<EventTarget>,
    pub bus: Arc<EventEmitter>,
    pub recorder: Recorder,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            registry: ListenerRegistry::with_name("integration"),
            window: Arc::new(EventTarget::new("window")),
            bus: Arc::new(EventEmitter::new("bus")),
            recorder: Recorder::new(),
        }
    }

    pub fn window_handle(&self) -> Arc<dyn Emitter> {
        self.window.clone()
    }

    pub fn bus_handle(&self) -> Arc<dyn Emitter> {
        self.bus.clone()
    }
}
