//! Observers and their invocation

use crate::error::EventError;
use crate::event::{EventName, EventParameters, PluginName};
use crate::utils::panic_message;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Callback invoked when an observed event is dispatched
pub trait ObserverCallback: Send + Sync {
    /// Handle the event. Changes made to `parameters` are visible to the
    /// observers that run afterwards and to the caller.
    fn notify(&self, parameters: &mut EventParameters) -> Result<(), EventError>;
}

impl<F> ObserverCallback for F
where
    F: Fn(&mut EventParameters) -> Result<(), EventError> + Send + Sync,
{
    fn notify(&self, parameters: &mut EventParameters) -> Result<(), EventError> {
        self(parameters)
    }
}

/// A registered callback plus the metadata the dispatcher orders and filters by
#[derive(Clone)]
pub struct Observer {
    name: String,
    plugin: Option<PluginName>,
    sequence: u64,
    callback: Arc<dyn ObserverCallback>,
}

impl Observer {
    /// Wrap a closure. The owner and sequence number are assigned at registration.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut EventParameters) -> Result<(), EventError> + Send + Sync + 'static,
    {
        Self::from_callback(callback)
    }

    /// Wrap any callback implementation
    pub fn from_callback<C>(callback: C) -> Self
    where
        C: ObserverCallback + 'static,
    {
        Self {
            name: String::new(),
            plugin: None,
            sequence: 0,
            callback: Arc::new(callback),
        }
    }

    /// Set a display name used in logs and failure reports
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mark the observer as owned by a plugin
    pub fn owned_by(mut self, plugin: impl Into<PluginName>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> Option<&PluginName> {
        self.plugin.as_ref()
    }

    /// Registration sequence number, unique and increasing per dispatcher
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn stamp(&mut self, event_name: &EventName, sequence: u64) {
        self.sequence = sequence;
        if self.name.is_empty() {
            self.name = match &self.plugin {
                Some(plugin) => format!("{}::{}#{}", plugin, event_name, sequence),
                None => format!("{}#{}", event_name, sequence),
            };
        }
    }

    /// Run the callback, turning a panic into an error
    pub(crate) fn invoke(&self, parameters: &mut EventParameters) -> Result<(), EventError> {
        match catch_unwind(AssertUnwindSafe(|| self.callback.notify(parameters))) {
            Ok(result) => result,
            Err(panic_info) => Err(EventError::ObserverPanicked(panic_message(panic_info))),
        }
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// An observer that failed during a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverFailure {
    pub observer: String,
    pub plugin: Option<PluginName>,
    pub message: String,
}
