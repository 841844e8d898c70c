//! # Tally Events
//!
//! Ordered observer registry and synchronous event dispatcher used by the
//! Tally analytics host and its plugins.
//!
//! ## Key Features
//!
//! - **Ordered delivery**: observers run in exactly the order they were registered
//! - **Shared parameters**: every observer receives the same `&mut EventParameters`,
//!   so mutations are visible to later observers and to the caller
//! - **Plugin filtering**: a dispatch can be restricted to observers owned by a set of plugins
//! - **Pending replay**: pending events are delivered now and replayed to plugins loaded later
//! - **Failure isolation**: a failing or panicking observer never stops its siblings
//! - **Test-only events**: instrumentation hooks that only fire when test mode is enabled
//!
//! ## Architecture
//!
//! - **EventDispatcher**: registry plus dispatch loop, owned by the composition root
//! - **PluginContext**: registration scope that stamps the owning plugin on observers
//! - **PluginManager**: loads plugins in order and replays pending events to them
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tally_events::*;
//! use serde_json::json;
//!
//! let dispatcher = Arc::new(EventDispatcher::new(DispatcherConfig::default()));
//!
//! dispatcher.add_observer("Site.created", |params: &mut EventParameters| {
//!     params.set_field(0, "name", "demo")?;
//!     Ok(())
//! });
//!
//! let mut params = EventParameters::from(vec![json!({ "siteId": 5 })]);
//! let report = dispatcher.post_event("Site.created", &mut params, false, None);
//!
//! assert!(report.is_success());
//! assert_eq!(params.get(0), Some(&json!({ "siteId": 5, "name": "demo" })));
//! ```
//!
//! ## Usage invariant
//!
//! Observers are registered during plugin initialization, before dispatch
//! traffic starts. The registry tolerates registration at any time, but
//! observers added while an event is being delivered only see later dispatches.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod filter;
pub mod macros;
pub mod manager;
pub mod observer;
pub mod plugin;
pub mod utils;

#[cfg(test)]
mod tests;

pub use context::PluginContext;
pub use dispatcher::{DispatchReport, DispatcherConfig, EventDispatcher, EventStats, PendingEvent};
pub use error::{EventError, PluginSystemError};
pub use event::{EventName, EventParameters, PluginName};
pub use filter::PluginFilter;
pub use manager::{LoadedPlugin, PluginConfig, PluginManager};
pub use observer::{Observer, ObserverCallback, ObserverFailure};
pub use plugin::{Plugin, PluginFactory, PluginMetadata, SimplePluginFactory};

#[doc(hidden)]
pub use serde_json;

/// Version of the observer API plugins are built against
pub const TALLY_EVENTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the plugin layer
pub type Result<T> = std::result::Result<T, PluginSystemError>;
