//! Error types for the event dispatcher and plugin layer

/// Errors raised by observers and parameter access
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Observer reported a failure
    #[error("Observer failed: {0}")]
    ObserverFailed(String),

    /// Observer panicked while handling the event
    #[error("Observer panicked: {0}")]
    ObserverPanicked(String),

    /// Parameter index out of range or of the wrong shape
    #[error("Invalid event parameter: {0}")]
    InvalidParameter(String),

    /// Parameter could not be converted to or from JSON
    #[error("Parameter serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}

/// Errors raised while loading and running plugins
#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    /// A plugin with the same name is already loaded
    #[error("Plugin already loaded: {0}")]
    AlreadyLoaded(String),

    /// No plugin with this name
    #[error("Plugin not found: {0}")]
    NotFound(String),

    /// Loading would exceed the configured plugin limit
    #[error("Plugin limit of {limit} reached, cannot load {plugin}")]
    TooManyPlugins { plugin: String, limit: usize },

    /// Plugin was built against an incompatible observer API
    #[error("Version mismatch: {0}")]
    VersionMismatch(String),

    /// Plugin failed while registering its observers
    #[error("Observer registration failed for {plugin}: {reason}")]
    RegistrationFailed { plugin: String, reason: String },

    /// Plugin failed during init or shutdown
    #[error("Plugin lifecycle error: {0}")]
    Lifecycle(String),

    /// Plugin panicked
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Event layer error surfaced through a plugin
    #[error("Event error: {0}")]
    Event(#[from] EventError),
}
