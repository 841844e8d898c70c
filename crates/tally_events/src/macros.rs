//! Macros for plugin development

/// Register several observers on a context or dispatcher in one go.
///
/// Observers are registered in the order they are listed.
///
/// ```rust
/// use std::sync::Arc;
/// use tally_events::{register_observers, EventDispatcher, PluginContext};
///
/// let context = PluginContext::new(Arc::new(EventDispatcher::default())).for_plugin("Goals");
/// register_observers!(context;
///     "Site.created" => |_params| Ok(()),
///     "Site.deleted" => |_params| Ok(()),
/// );
/// assert_eq!(context.dispatcher().registered_events().len(), 2);
/// ```
#[macro_export]
macro_rules! register_observers {
    ($target:expr; $($event_name:expr => $observer:expr),* $(,)?) => {{
        $(
            $target.add_observer($event_name, $observer);
        )*
    }};
}

/// Build [`EventParameters`](crate::EventParameters) from JSON-like values.
///
/// ```rust
/// let params = tally_events::event_params![{ "siteId": 5 }, "demo"];
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! event_params {
    () => {
        $crate::EventParameters::new()
    };
    ($($value:tt),+ $(,)?) => {
        $crate::EventParameters::from(vec![$($crate::serde_json::json!($value)),+])
    };
}
