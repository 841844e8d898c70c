//! Plugin filtering for restricted dispatches

use crate::event::PluginName;
use std::collections::HashSet;

/// Set of plugins a dispatch is restricted to.
///
/// Only observers owned by one of these plugins are invoked. Observers that
/// were registered without an owning plugin never pass a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginFilter {
    allowed: HashSet<PluginName>,
}

impl PluginFilter {
    /// Create an empty filter (matches nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter that lets a single plugin through
    pub fn only(plugin: impl Into<PluginName>) -> Self {
        Self::new().allow(plugin)
    }

    /// Add a plugin to the allowed set
    pub fn allow(mut self, plugin: impl Into<PluginName>) -> Self {
        self.allowed.insert(plugin.into());
        self
    }

    pub fn contains(&self, plugin: &PluginName) -> bool {
        self.allowed.contains(plugin)
    }

    /// Whether an observer with this owner should receive the event
    pub fn allows(&self, owner: Option<&PluginName>) -> bool {
        owner.is_some_and(|plugin| self.allowed.contains(plugin))
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl<P: Into<PluginName>> FromIterator<P> for PluginFilter {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            allowed: iter.into_iter().map(Into::into).collect(),
        }
    }
}
