//! Activity log plugin
//!
//! Records every occurrence of a configurable set of host events into a
//! shared [`ActivityTrail`] and adds an entry to the admin menu.
//!
//! The host can share its own trail through the plugin context
//! (`PluginContext::add_shared_provider(Arc<ActivityTrail>)`); otherwise the
//! plugin keeps a private one.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tally_events::utils::current_timestamp;
use tally_events::{
    EventError, EventParameters, Plugin, PluginContext, PluginSystemError, SimplePluginFactory,
};
use tracing::{debug, info};

pub const PLUGIN_NAME: &str = "ActivityLog";
pub const PLUGIN_VERSION: &str = "1.0.0";

/// Events recorded when no explicit list is given
pub const DEFAULT_EVENTS: &[&str] = &["Host.initialized", "Site.created", "Site.deleted"];

/// Event the host posts to collect admin menu items
pub const ADMIN_MENU_EVENT: &str = "Menu.Admin.addItems";

const DEFAULT_TRAIL_CAPACITY: usize = 500;

/// One recorded event occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub event: String,
    /// Parameters as the observer saw them
    pub parameters: Vec<Value>,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Bounded, shared log of recorded events. Oldest entries are evicted first.
#[derive(Debug)]
pub struct ActivityTrail {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityTrail {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, entry: ActivityEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of the trail, oldest first
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn count_for(&self, event: &str) -> usize {
        self.entries.lock().iter().filter(|entry| entry.event == event).count()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ActivityTrail {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_CAPACITY)
    }
}

pub struct ActivityLogPlugin {
    watched: Vec<String>,
    trail: Option<Arc<ActivityTrail>>,
}

impl ActivityLogPlugin {
    pub fn new() -> Self {
        Self::with_events(DEFAULT_EVENTS.iter().copied())
    }

    /// Record only the given events
    pub fn with_events<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            watched: events.into_iter().map(Into::into).collect(),
            trail: None,
        }
    }

    pub fn watched_events(&self) -> &[String] {
        &self.watched
    }

    /// Trail in use, available once observers are registered
    pub fn trail(&self) -> Option<Arc<ActivityTrail>> {
        self.trail.clone()
    }
}

impl Default for ActivityLogPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Append this plugin's admin menu item to the list in the first parameter
fn add_admin_menu_item(params: &mut EventParameters) -> Result<(), EventError> {
    let items = params
        .get_mut(0)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| {
            EventError::InvalidParameter(format!("{} expects a list of menu items", ADMIN_MENU_EVENT))
        })?;

    items.push(json!({
        "category": "General_Settings",
        "name": "ActivityLog_MenuTitle",
        "url": "index.php?module=ActivityLog&action=index",
        "order": 30,
    }));
    Ok(())
}

impl Plugin for ActivityLogPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn version(&self) -> &str {
        PLUGIN_VERSION
    }

    fn register_observers(&mut self, context: &PluginContext) -> Result<(), PluginSystemError> {
        let trail = context
            .shared_provider::<ActivityTrail>()
            .unwrap_or_else(|| Arc::new(ActivityTrail::default()));

        for event in &self.watched {
            let trail = trail.clone();
            let event_name = event.clone();
            context.add_observer(event.as_str(), move |params: &mut EventParameters| {
                debug!("📝 ActivityLog: {} with {} parameter(s)", event_name, params.len());
                trail.record(ActivityEntry {
                    event: event_name.clone(),
                    parameters: params.values().to_vec(),
                    timestamp: current_timestamp(),
                });
                Ok(())
            });
        }

        context.add_observer(ADMIN_MENU_EVENT, add_admin_menu_item);

        info!("📝 ActivityLog: watching {} event(s)", self.watched.len());
        self.trail = Some(trail);
        Ok(())
    }

    fn on_shutdown(&mut self, _context: &PluginContext) -> Result<(), PluginSystemError> {
        let recorded = self.trail.as_ref().map(|trail| trail.len()).unwrap_or(0);
        info!("📝 ActivityLog: shutting down with {} recorded event(s)", recorded);
        Ok(())
    }
}

/// Factory used by the host's built-in plugin table
pub fn factory() -> SimplePluginFactory<ActivityLogPlugin> {
    SimplePluginFactory::new(PLUGIN_NAME, PLUGIN_VERSION, ActivityLogPlugin::new)
}
