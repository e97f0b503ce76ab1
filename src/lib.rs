//! Page-side helpers built around a keyed event-listener registry.
//!
//! The [`ListenerRegistry`] remembers one listener per
//! `(emitter, event name, listener key)` and swaps it out on re-registration,
//! so callers never have to hold on to the old handle. The remaining modules
//! are small independent helpers (storage, validation, URL params, dates,
//! user-agent sniffing, a cipher wrapper and a retry loop).

pub mod common;
pub mod config;
pub mod error;
pub mod events;
pub mod listeners;
pub mod utils;

use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::common::{retry, RetryPolicy};
pub use crate::config::{Config, ConfigManager};
pub use crate::error::{ErrorCode, PageKitError, Result};
pub use crate::events::{listener, Event, EventEmitter, EventTarget, Listener};
pub use crate::listeners::{
    Capability, Emitter, EmitterStyle, ListenerError, ListenerRegistry, RegistrySnapshot,
    TargetStyle,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load `.env` and install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Calling this more than once is harmless; only the
/// first subscriber is kept.
pub fn init_tracing() {
    let env_file_path = dotenvy::dotenv().ok();

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "pagekit=debug,warn".into()
            } else {
                "pagekit=info,warn".into()
            }
        }))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        match env_file_path {
            Some(path) => debug!("Loaded environment variables from {}", path.display()),
            None => debug!("No .env file found. Using existing environment variables."),
        }
    }
}
