//! Plugin trait, factories and metadata

use crate::context::PluginContext;
use crate::error::PluginSystemError;

/// A unit of host functionality that reacts to events.
///
/// Plugins register all their observers once, while they are loaded, through
/// the context handed to [`register_observers`](Plugin::register_observers).
pub trait Plugin: Send + Sync {
    /// Returns the name of this plugin
    fn name(&self) -> &str;

    /// Returns the version string of this plugin
    fn version(&self) -> &str;

    /// Version of the observer API this plugin was built against
    fn api_version(&self) -> &str {
        crate::TALLY_EVENTS_VERSION
    }

    /// Register event observers. Called once, before `on_init`.
    fn register_observers(&mut self, context: &PluginContext) -> Result<(), PluginSystemError>;

    /// Initialize the plugin with context
    fn on_init(&mut self, _context: &PluginContext) -> Result<(), PluginSystemError> {
        Ok(())
    }

    /// Shutdown the plugin gracefully
    fn on_shutdown(&mut self, _context: &PluginContext) -> Result<(), PluginSystemError> {
        Ok(())
    }
}

/// Trait for plugin factories that can create plugin instances
pub trait PluginFactory: Send + Sync {
    /// Create a new plugin instance
    fn create(&self) -> Result<Box<dyn Plugin>, PluginSystemError>;

    fn plugin_name(&self) -> &str;

    fn plugin_version(&self) -> &str;
}

/// Simple plugin factory that wraps a constructor function
pub struct SimplePluginFactory<T: Plugin> {
    constructor: Box<dyn Fn() -> T + Send + Sync>,
    name: String,
    version: String,
}

impl<T: Plugin> SimplePluginFactory<T> {
    pub fn new<F>(name: impl Into<String>, version: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            constructor: Box::new(constructor),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl<T: Plugin + 'static> PluginFactory for SimplePluginFactory<T> {
    fn create(&self) -> Result<Box<dyn Plugin>, PluginSystemError> {
        Ok(Box::new((self.constructor)()))
    }

    fn plugin_name(&self) -> &str {
        &self.name
    }

    fn plugin_version(&self) -> &str {
        &self.version
    }
}

/// Plugin metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    /// Position in the load sequence, starting at 0
    pub load_order: usize,
    /// Number of observers the plugin registered while loading
    pub observers: usize,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            load_order: 0,
            observers: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
