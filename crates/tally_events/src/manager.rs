//! Plugin manager: ordered loading, pending replay and shutdown

use crate::context::PluginContext;
use crate::dispatcher::EventDispatcher;
use crate::error::PluginSystemError;
use crate::event::PluginName;
use crate::filter::PluginFilter;
use crate::plugin::{Plugin, PluginFactory, PluginMetadata};
use crate::utils::{is_version_compatible, panic_message};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Configuration for plugin loading safety checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Ignore observer API version differences
    #[serde(default)]
    pub allow_version_mismatch: bool,

    /// Require exact version matching including patch digits
    #[serde(default)]
    pub strict_versioning: bool,

    /// Maximum number of plugins to load
    #[serde(default)]
    pub max_plugins: Option<usize>,
}

/// Information about a loaded plugin
pub struct LoadedPlugin {
    pub metadata: PluginMetadata,
    pub plugin: Box<dyn Plugin>,
    context: PluginContext,
}

/// Loads plugins in order and keeps them alive for the life of the host.
///
/// Loading a plugin registers its observers, initializes it, then replays the
/// pending events recorded so far to that plugin alone.
pub struct PluginManager {
    dispatcher: Arc<EventDispatcher>,
    context_template: PluginContext,
    loaded: Vec<LoadedPlugin>,
    config: PluginConfig,
}

impl PluginManager {
    pub fn new(context_template: PluginContext, config: PluginConfig) -> Self {
        Self {
            dispatcher: context_template.dispatcher(),
            context_template,
            loaded: Vec::new(),
            config,
        }
    }

    /// Template the per-plugin contexts are derived from
    pub fn context_template(&self) -> &PluginContext {
        &self.context_template
    }

    pub fn context_template_mut(&mut self) -> &mut PluginContext {
        &mut self.context_template
    }

    /// Load a plugin created by a factory
    pub fn load_plugin_from_factory(
        &mut self,
        factory: &dyn PluginFactory,
    ) -> Result<PluginName, PluginSystemError> {
        let plugin = factory.create()?;
        self.load_plugin(plugin)
    }

    /// Load a plugin instance
    pub fn load_plugin(&mut self, mut plugin: Box<dyn Plugin>) -> Result<PluginName, PluginSystemError> {
        let plugin_name = plugin.name().to_string();
        info!("🔄 Loading plugin: {}", plugin_name);

        if self.is_plugin_loaded(&plugin_name) {
            return Err(PluginSystemError::AlreadyLoaded(plugin_name));
        }

        if let Some(limit) = self.config.max_plugins {
            if self.loaded.len() >= limit {
                return Err(PluginSystemError::TooManyPlugins { plugin: plugin_name, limit });
            }
        }

        self.validate_plugin_compatibility(&plugin_name, plugin.api_version())?;

        let context = self.context_template.for_plugin(plugin_name.as_str());
        let owner = PluginName::from(plugin_name.as_str());
        let observers_before = self.dispatcher.stats().total_observers;

        if let Err(e) = guarded(&plugin_name, || plugin.register_observers(&context)) {
            error!("❌ Failed to register observers for plugin {}: {}", plugin_name, e);
            self.dispatcher.remove_plugin_observers(&owner);
            return Err(PluginSystemError::RegistrationFailed {
                plugin: plugin_name,
                reason: e.to_string(),
            });
        }
        let observers = self.dispatcher.stats().total_observers - observers_before;
        info!("📡 {} observer(s) registered for plugin: {}", observers, plugin_name);

        // A plugin that fails to initialize must not keep receiving events
        if let Err(e) = guarded(&plugin_name, || plugin.on_init(&context)) {
            error!("❌ Plugin initialization failed for {}: {}", plugin_name, e);
            self.dispatcher.remove_plugin_observers(&owner);
            return Err(e);
        }

        let mut metadata = PluginMetadata::new(plugin_name.as_str(), plugin.version());
        metadata.load_order = self.loaded.len();
        metadata.observers = observers as usize;
        self.loaded.push(LoadedPlugin { metadata, plugin, context });

        let replayed = self.dispatcher.post_pending_events_to(&owner);
        let delivered = replayed.iter().filter(|report| report.matched > 0).count();
        if delivered > 0 {
            info!("⏪ Replayed {} pending event(s) to plugin: {}", delivered, plugin_name);
        }

        info!("✅ Plugin loaded: {}", plugin_name);
        Ok(owner)
    }

    /// Shut plugins down in reverse load order and drop them
    pub fn shutdown(&mut self) {
        info!("🛑 Shutting down {} plugins", self.loaded.len());

        while let Some(mut loaded) = self.loaded.pop() {
            let plugin_name = loaded.metadata.name.clone();
            let context = loaded.context.clone();
            match guarded(&plugin_name, || loaded.plugin.on_shutdown(&context)) {
                Ok(()) => info!("✅ Plugin shutdown completed: {}", plugin_name),
                // Keep going so the other plugins still shut down
                Err(e) => error!("❌ Plugin shutdown failed for {}: {}", plugin_name, e),
            }
        }

        info!("🧹 Plugin cleanup completed");
    }

    fn validate_plugin_compatibility(
        &self,
        plugin_name: &str,
        api_version: &str,
    ) -> Result<(), PluginSystemError> {
        let expected = crate::TALLY_EVENTS_VERSION;
        if self.config.allow_version_mismatch {
            if api_version != expected {
                warn!(
                    "⚠️ Plugin {} built against API v{}, host is v{} (allowed by config)",
                    plugin_name, api_version, expected
                );
            }
            return Ok(());
        }

        let compatible = if self.config.strict_versioning {
            api_version == expected
        } else {
            is_version_compatible(api_version, expected)
        };

        if compatible {
            Ok(())
        } else {
            Err(PluginSystemError::VersionMismatch(format!(
                "plugin {} built against API v{}, host is v{}",
                plugin_name, api_version, expected
            )))
        }
    }

    pub fn plugin_count(&self) -> usize {
        self.loaded.len()
    }

    /// Names of loaded plugins in load order
    pub fn plugin_names(&self) -> Vec<String> {
        self.loaded.iter().map(|loaded| loaded.metadata.name.clone()).collect()
    }

    pub fn is_plugin_loaded(&self, plugin_name: &str) -> bool {
        self.loaded.iter().any(|loaded| loaded.metadata.name == plugin_name)
    }

    pub fn plugin_metadata(&self, plugin_name: &str) -> Option<PluginMetadata> {
        self.loaded
            .iter()
            .find(|loaded| loaded.metadata.name == plugin_name)
            .map(|loaded| loaded.metadata.clone())
    }

    /// Filter matching every loaded plugin
    pub fn loaded_filter(&self) -> PluginFilter {
        self.loaded.iter().map(|loaded| loaded.metadata.name.as_str()).collect()
    }
}

/// Run a plugin hook, converting a panic into an error
fn guarded<F>(plugin_name: &str, hook: F) -> Result<(), PluginSystemError>
where
    F: FnOnce() -> Result<(), PluginSystemError>,
{
    match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(panic_info) => Err(PluginSystemError::Runtime(format!(
            "plugin {} panicked: {}",
            plugin_name,
            panic_message(panic_info)
        ))),
    }
}
