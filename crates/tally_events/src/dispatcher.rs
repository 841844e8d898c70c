//! Observer registry and the synchronous dispatch loop

use crate::error::EventError;
use crate::event::{EventName, EventParameters, PluginName};
use crate::filter::PluginFilter;
use crate::observer::{Observer, ObserverFailure};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

type ObserverList = SmallVec<[Arc<Observer>; 4]>;

fn default_record_pending() -> bool {
    true
}

fn default_max_pending() -> usize {
    1024
}

/// Dispatcher settings, usually read from the `[dispatcher]` config section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Enables `post_test_event`. Off in production.
    #[serde(default)]
    pub test_mode: bool,
    /// Keep pending events for replay to plugins loaded later
    #[serde(default = "default_record_pending")]
    pub record_pending: bool,
    /// Upper bound of the pending queue; the oldest entry is dropped beyond it
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            record_pending: default_record_pending(),
            max_pending: default_max_pending(),
        }
    }
}

/// Statistics for dispatcher monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStats {
    pub events_dispatched: u64,
    pub observers_invoked: u64,
    pub observer_failures: u64,
    pub registry_lookups: u64,
    pub total_observers: u64,
    pub pending_recorded: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    events_dispatched: AtomicU64,
    observers_invoked: AtomicU64,
    observer_failures: AtomicU64,
    registry_lookups: AtomicU64,
    total_observers: AtomicU64,
    pending_recorded: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> EventStats {
        EventStats {
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            observers_invoked: self.observers_invoked.load(Ordering::Relaxed),
            observer_failures: self.observer_failures.load(Ordering::Relaxed),
            registry_lookups: self.registry_lookups.load(Ordering::Relaxed),
            total_observers: self.total_observers.load(Ordering::Relaxed),
            pending_recorded: self.pending_recorded.load(Ordering::Relaxed),
        }
    }

    fn clear(&self) {
        for counter in [
            &self.events_dispatched,
            &self.observers_invoked,
            &self.observer_failures,
            &self.registry_lookups,
            &self.total_observers,
            &self.pending_recorded,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// A pending dispatch kept for replay to plugins loaded later
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub event_name: EventName,
    /// Parameters as posted, before any observer ran
    pub parameters: EventParameters,
    pub filter: Option<PluginFilter>,
}

/// Outcome of a single dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_name: EventName,
    /// Observers that passed the plugin filter
    pub matched: usize,
    /// Observers that completed without error
    pub invoked: usize,
    pub failures: Vec<ObserverFailure>,
}

impl DispatchReport {
    fn new(event_name: EventName) -> Self {
        Self {
            event_name,
            matched: 0,
            invoked: 0,
            failures: Vec::new(),
        }
    }

    /// True when no observer failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered observer registry with synchronous delivery.
///
/// Construct one per process in the composition root and share it through
/// `Arc`. Observers for an event run in registration order on the caller's
/// thread, each seeing the parameter mutations of the ones before it.
pub struct EventDispatcher {
    observers: DashMap<EventName, ObserverList>,
    next_sequence: AtomicU64,
    pending: Mutex<VecDeque<PendingEvent>>,
    config: DispatcherConfig,
    stats: StatsCounters,
}

impl EventDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            observers: DashMap::new(),
            next_sequence: AtomicU64::new(0),
            pending: Mutex::new(VecDeque::new()),
            config,
            stats: StatsCounters::default(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn is_test_mode(&self) -> bool {
        self.config.test_mode
    }

    /// Append an observer to the list for `event_name`.
    ///
    /// Duplicates are allowed and run once per registration. Returns the
    /// sequence number assigned to the observer.
    pub fn register(&self, event_name: impl Into<EventName>, mut observer: Observer) -> u64 {
        let event_name = event_name.into();
        let mut list = self.observers.entry(event_name.clone()).or_default();

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        observer.stamp(&event_name, sequence);
        debug!("📝 Registered observer {} for {}", observer.name(), event_name);

        list.push(Arc::new(observer));
        self.stats.total_observers.fetch_add(1, Ordering::Relaxed);
        sequence
    }

    /// Register a closure that is not owned by any plugin
    pub fn add_observer<F>(&self, event_name: impl Into<EventName>, callback: F) -> u64
    where
        F: Fn(&mut EventParameters) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.register(event_name, Observer::new(callback))
    }

    /// Drop every observer owned by `plugin` and return how many were removed.
    ///
    /// Only the plugin manager calls this, to undo the registrations of a
    /// plugin whose load failed.
    pub(crate) fn remove_plugin_observers(&self, plugin: &PluginName) -> usize {
        let mut removed = 0;
        for mut entry in self.observers.iter_mut() {
            let before = entry.len();
            entry.retain(|observer| observer.plugin() != Some(plugin));
            removed += before - entry.len();
        }
        self.observers.retain(|_, list| !list.is_empty());
        self.stats.total_observers.fetch_sub(removed as u64, Ordering::Relaxed);
        if removed > 0 {
            debug!("🧹 Removed {} observer(s) of plugin {}", removed, plugin);
        }
        removed
    }

    /// Post an event to its observers.
    ///
    /// Observers run in registration order; when `plugins` is given only the
    /// observers owned by those plugins run. A `pending` event is delivered
    /// right away and also kept so that plugins loaded later receive it
    /// through [`post_pending_events_to`](Self::post_pending_events_to).
    ///
    /// Failing or panicking observers are logged and collected in the
    /// returned report; the remaining observers still run.
    pub fn post_event(
        &self,
        event_name: impl Into<EventName>,
        parameters: &mut EventParameters,
        pending: bool,
        plugins: Option<&PluginFilter>,
    ) -> DispatchReport {
        let event_name = event_name.into();
        if pending {
            self.record_pending(&event_name, parameters, plugins);
        }
        self.deliver(event_name, parameters, plugins)
    }

    /// Shorthand for a non-pending, unfiltered dispatch
    pub fn dispatch(
        &self,
        event_name: impl Into<EventName>,
        parameters: &mut EventParameters,
    ) -> DispatchReport {
        self.post_event(event_name, parameters, false, None)
    }

    /// Post an event only when test mode is enabled.
    ///
    /// Outside test mode this returns `None` without consulting the registry,
    /// touching the pending queue or updating statistics.
    pub fn post_test_event(
        &self,
        event_name: impl Into<EventName>,
        parameters: &mut EventParameters,
        pending: bool,
        plugins: Option<&PluginFilter>,
    ) -> Option<DispatchReport> {
        if !self.config.test_mode {
            return None;
        }
        Some(self.post_event(event_name, parameters, pending, plugins))
    }

    /// Replay every recorded pending event to the observers of one plugin.
    ///
    /// Each replay gets its own copy of the parameters as originally posted.
    /// Pending events that were restricted to other plugins are skipped.
    pub fn post_pending_events_to(&self, plugin: &PluginName) -> Vec<DispatchReport> {
        let pending: Vec<PendingEvent> = self.pending.lock().iter().cloned().collect();
        if pending.is_empty() {
            return Vec::new();
        }

        let only_plugin = PluginFilter::only(plugin.clone());
        pending
            .into_iter()
            .filter(|event| event.filter.as_ref().map_or(true, |filter| filter.contains(plugin)))
            .map(|mut event| self.deliver(event.event_name, &mut event.parameters, Some(&only_plugin)))
            .collect()
    }

    fn record_pending(
        &self,
        event_name: &EventName,
        parameters: &EventParameters,
        plugins: Option<&PluginFilter>,
    ) {
        if !self.config.record_pending || self.config.max_pending == 0 {
            return;
        }

        let mut pending = self.pending.lock();
        if pending.len() >= self.config.max_pending {
            if let Some(dropped) = pending.pop_front() {
                warn!(
                    "⚠️ Pending queue full ({}), dropping oldest event {}",
                    self.config.max_pending, dropped.event_name
                );
            }
        }
        pending.push_back(PendingEvent {
            event_name: event_name.clone(),
            parameters: parameters.clone(),
            filter: plugins.cloned(),
        });
        self.stats.pending_recorded.fetch_add(1, Ordering::Relaxed);
    }

    fn deliver(
        &self,
        event_name: EventName,
        parameters: &mut EventParameters,
        plugins: Option<&PluginFilter>,
    ) -> DispatchReport {
        self.stats.registry_lookups.fetch_add(1, Ordering::Relaxed);
        self.stats.events_dispatched.fetch_add(1, Ordering::Relaxed);

        // Snapshot so observers can register or dispatch without holding the shard lock
        let observers = self.observers.get(&event_name).map(|entry| entry.value().clone());
        let mut report = DispatchReport::new(event_name);

        let Some(observers) = observers else {
            trace!("No observers for {}", report.event_name);
            return report;
        };

        debug!("📤 Posting {} to {} observer(s)", report.event_name, observers.len());

        for observer in observers.iter() {
            if let Some(filter) = plugins {
                if !filter.allows(observer.plugin()) {
                    continue;
                }
            }

            report.matched += 1;
            match observer.invoke(parameters) {
                Ok(()) => report.invoked += 1,
                Err(e) => {
                    error!("❌ Observer {} failed on {}: {}", observer.name(), report.event_name, e);
                    report.failures.push(ObserverFailure {
                        observer: observer.name().to_string(),
                        plugin: observer.plugin().cloned(),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.stats.observers_invoked.fetch_add(report.invoked as u64, Ordering::Relaxed);
        self.stats.observer_failures.fetch_add(report.failures.len() as u64, Ordering::Relaxed);
        report
    }

    /// Number of observers registered for an event
    pub fn observer_count(&self, event_name: impl Into<EventName>) -> usize {
        self.observers
            .get(&event_name.into())
            .map_or(0, |entry| entry.value().len())
    }

    /// All event names with at least one observer, sorted
    pub fn registered_events(&self) -> Vec<EventName> {
        let mut names: Vec<EventName> = self.observers.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Observers registered for an event, in invocation order
    pub fn observers_for(&self, event_name: impl Into<EventName>) -> Vec<Arc<Observer>> {
        self.observers
            .get(&event_name.into())
            .map(|entry| entry.value().to_vec())
            .unwrap_or_default()
    }

    pub fn pending_events(&self) -> Vec<PendingEvent> {
        self.pending.lock().iter().cloned().collect()
    }

    pub fn stats(&self) -> EventStats {
        self.stats.snapshot()
    }

    /// Drop every observer, pending event and counter. Meant for test harnesses.
    pub fn reset(&self) {
        self.observers.clear();
        self.pending.lock().clear();
        self.next_sequence.store(0, Ordering::Relaxed);
        self.stats.clear();
        debug!("🧹 Dispatcher reset");
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}
