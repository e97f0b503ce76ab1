//! Registry behaviour across both emitter styles
use std::sync::Arc;

use serde_json::json;

use crate::harness::TestEnvironment;
use pagekit::{listener, Event, EventTarget, ListenerRegistry};

#[test]
fn test_rebinding_replaces_listener_on_target() {
    let env = TestEnvironment::new();
    let key = "window_resize_layout_onResize";

    env.registry
        .register(env.window_handle(), "resize", env.recorder.listener("first"), key)
        .unwrap();
    let snapshot = env
        .registry
        .register(env.window_handle(), "resize", env.recorder.listener("second"), key)
        .unwrap();

    assert_eq!(env.window.listener_count("resize"), 1);
    assert_eq!(snapshot.keys_for("window", "resize"), vec![key.to_string()]);

    env.window.dispatch_event(&Event::named("resize"));
    assert_eq!(env.recorder.tags(), vec!["second".to_string()]);
}

#[test]
fn test_rebinding_replaces_listener_on_emitter() {
    let env = TestEnvironment::new();
    let key = "bus_message_chat_onMessage";

    env.registry
        .register(env.bus_handle(), "message", env.recorder.listener("first"), key)
        .unwrap();
    env.registry
        .register(env.bus_handle(), "message", env.recorder.listener("second"), key)
        .unwrap();

    assert!(env.bus.emit("message", json!({ "text": "hi" })));
    assert_eq!(env.recorder.tags(), vec!["second".to_string()]);
}

#[test]
fn test_unregister_detaches_and_is_idempotent() {
    let env = TestEnvironment::new();
    let key = "bus_message_chat_onMessage";

    env.registry
        .register(env.bus_handle(), "message", env.recorder.listener("chat"), key)
        .unwrap();

    let snapshot = env.registry.unregister(&*env.bus, "message", key).unwrap();
    assert_eq!(snapshot.map(|s| s.binding_count()), Some(0));
    assert!(!env.bus.emit("message", json!(null)));

    assert!(env.registry.unregister(&*env.bus, "message", key).unwrap().is_none());
    assert_eq!(env.registry.emitter_count(), 0);
}

#[test]
fn test_keys_and_emitters_are_isolated() {
    let env = TestEnvironment::new();

    env.registry
        .register(env.window_handle(), "resize", env.recorder.listener("a"), "key_a")
        .unwrap();
    env.registry
        .register(env.window_handle(), "resize", env.recorder.listener("b"), "key_b")
        .unwrap();
    env.registry
        .register(env.bus_handle(), "resize", env.recorder.listener("bus"), "key_a")
        .unwrap();

    assert_eq!(env.registry.binding_count(), 3);
    assert_eq!(env.registry.emitter_count(), 2);

    env.registry.unregister(&*env.window, "resize", "key_a").unwrap();
    assert!(env.registry.is_registered(&*env.window, "resize", "key_b"));
    assert!(env.registry.is_registered(&*env.bus, "resize", "key_a"));

    env.window.dispatch_event(&Event::named("resize"));
    env.bus.emit("resize", json!(null));
    assert_eq!(env.recorder.count("a"), 0);
    assert_eq!(env.recorder.count("b"), 1);
    assert_eq!(env.recorder.count("bus"), 1);
}

#[test]
fn test_unregister_emitter_clears_everything() {
    let env = TestEnvironment::new();

    for event in ["resize", "scroll", "focus"] {
        env.registry
            .register(env.window_handle(), event, env.recorder.listener(event), "page")
            .unwrap();
    }

    assert_eq!(env.registry.unregister_emitter(&*env.window).unwrap(), 3);
    assert_eq!(env.window.listener_count("scroll"), 0);
    assert_eq!(env.registry.snapshot().emitters.len(), 0);
    assert_eq!(env.registry.unregister_emitter(&*env.window).unwrap(), 0);
}

#[test]
fn test_listener_can_unregister_itself_from_inside_dispatch() {
    let registry = Arc::new(ListenerRegistry::with_name("reentrant"));
    let window = Arc::new(EventTarget::new("window"));

    let registry_ref = registry.clone();
    let window_ref = window.clone();
    let once = listener(move |_event: &Event| {
        registry_ref
            .unregister(&*window_ref, "load", "page_load_once")
            .unwrap();
    });

    registry
        .register(window.clone(), "load", once, "page_load_once")
        .unwrap();

    assert_eq!(window.dispatch_event(&Event::named("load")), 1);
    assert!(!registry.is_registered(&*window, "load", "page_load_once"));
    assert_eq!(window.dispatch_event(&Event::named("load")), 0);
}

#[test]
fn test_snapshot_serializes() {
    let env = TestEnvironment::new();
    env.registry
        .register(env.bus_handle(), "message", env.recorder.listener("chat"), "chat")
        .unwrap();

    let value = serde_json::to_value(env.registry.snapshot()).unwrap();
    assert_eq!(value["registry"], "integration");
    assert_eq!(value["emitters"][0]["label"], "bus");
    assert_eq!(value["emitters"][0]["capability"], "emitter");
    assert_eq!(value["emitters"][0]["events"]["message"], json!(["chat"]));
}
