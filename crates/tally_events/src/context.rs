//! Plugin registration scope and service injection

use crate::dispatcher::{DispatchReport, EventDispatcher};
use crate::error::EventError;
use crate::event::{EventName, EventParameters, PluginName};
use crate::filter::PluginFilter;
use crate::observer::Observer;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Context handed to a plugin while it registers observers.
///
/// Observers added through a context scoped to a plugin are owned by that
/// plugin, which is what plugin filters and pending replay match against.
/// The context also carries host services for dependency injection.
#[derive(Clone)]
pub struct PluginContext {
    dispatcher: Arc<EventDispatcher>,
    plugin: Option<PluginName>,
    providers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    metadata: HashMap<String, String>,
}

impl PluginContext {
    /// Create an unscoped context, used as the template for plugin contexts
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            dispatcher,
            plugin: None,
            providers: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Copy of this context scoped to one plugin
    pub fn for_plugin(&self, plugin: impl Into<PluginName>) -> Self {
        let mut context = self.clone();
        context.plugin = Some(plugin.into());
        context
    }

    pub fn dispatcher(&self) -> Arc<EventDispatcher> {
        self.dispatcher.clone()
    }

    /// Plugin this context registers observers for
    pub fn plugin_name(&self) -> Option<&PluginName> {
        self.plugin.as_ref()
    }

    /// Register a closure owned by this context's plugin
    pub fn add_observer<F>(&self, event_name: impl Into<EventName>, callback: F) -> u64
    where
        F: Fn(&mut EventParameters) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.register(event_name, Observer::new(callback))
    }

    /// Register an observer, overriding its owner with this context's plugin
    pub fn register(&self, event_name: impl Into<EventName>, observer: Observer) -> u64 {
        let observer = match &self.plugin {
            Some(plugin) => observer.owned_by(plugin.clone()),
            None => observer,
        };
        self.dispatcher.register(event_name, observer)
    }

    /// Post an event through the shared dispatcher
    pub fn post_event(
        &self,
        event_name: impl Into<EventName>,
        parameters: &mut EventParameters,
        pending: bool,
        plugins: Option<&PluginFilter>,
    ) -> DispatchReport {
        self.dispatcher.post_event(event_name, parameters, pending, plugins)
    }

    /// Add a context provider
    pub fn add_provider<T: Send + Sync + 'static>(&mut self, provider: T) {
        self.add_shared_provider(Arc::new(provider));
    }

    /// Add a provider that is already shared with the host
    pub fn add_shared_provider<T: Send + Sync + 'static>(&mut self, provider: Arc<T>) {
        self.providers.insert(TypeId::of::<T>(), provider);
    }

    /// Get a context provider
    pub fn get_provider<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.providers.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }

    /// Get a shared handle to a context provider
    pub fn shared_provider<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.providers.get(&TypeId::of::<T>())?.clone().downcast::<T>().ok()
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&String> {
        self.metadata.get(key)
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}
