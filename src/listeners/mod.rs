//! Listener registry for heterogeneous event sources.
//!
//! Application code binds listeners through [`ListenerRegistry`] under a
//! caller-chosen listener key, conventionally
//! `emitterName_eventName_moduleName_handlerName`. The registry works with any
//! type implementing [`Emitter`] that speaks either the target-style or the
//! emitter-style protocol.


pub mod capability;
pub mod registry;

pub use capability::{Capability, Emitter, EmitterStyle, ListenerError, TargetStyle};
pub use registry::{EmitterSnapshot, ListenerRegistry, RegistrySnapshot};
