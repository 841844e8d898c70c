//! Plugins compiled into the host, looked up by name from configuration

use crate::host::Host;
use plugin_activity_log::ActivityTrail;
use std::sync::Arc;
use tally_events::PluginFactory;

/// Names of all built-in plugins
pub fn builtin_names() -> Vec<&'static str> {
    vec![plugin_activity_log::PLUGIN_NAME]
}

pub fn is_builtin(name: &str) -> bool {
    builtin_names().contains(&name)
}

/// Factory for a built-in plugin
pub fn factory(name: &str) -> Option<Box<dyn PluginFactory>> {
    match name {
        plugin_activity_log::PLUGIN_NAME => Some(Box::new(plugin_activity_log::factory())),
        _ => None,
    }
}

/// Register the shared services built-in plugins expect on the host
pub fn install_providers(host: &mut Host) {
    host.provide(Arc::new(ActivityTrail::default()));
}

/// Activity trail installed by [`install_providers`]
pub fn activity_trail(host: &Host) -> Option<Arc<ActivityTrail>> {
    host.provider::<ActivityTrail>()
}
