//! Named option storage.
//!
//! Options are small string values keyed by name. Options flagged for
//! autoload are the ones a persistent backend would preload in one query at
//! startup; [`OptionStore::autoloaded`] lists them.

use dashmap::DashMap;

/// Storage backend for host options
pub trait OptionStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    /// Insert or overwrite an option
    fn set(&self, name: &str, value: &str, autoload: bool);

    /// Remove an option, returning whether it existed
    fn delete(&self, name: &str) -> bool;

    /// Options flagged for autoload, sorted by name
    fn autoloaded(&self) -> Vec<(String, String)>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredOption {
    value: String,
    autoload: bool,
}

/// Process-local option store
#[derive(Debug, Default)]
pub struct InMemoryOptionStore {
    options: DashMap<String, StoredOption>,
}

impl InMemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl OptionStore for InMemoryOptionStore {
    fn get(&self, name: &str) -> Option<String> {
        self.options.get(name).map(|option| option.value.clone())
    }

    fn set(&self, name: &str, value: &str, autoload: bool) {
        self.options.insert(
            name.to_string(),
            StoredOption {
                value: value.to_string(),
                autoload,
            },
        );
    }

    fn delete(&self, name: &str) -> bool {
        self.options.remove(name).is_some()
    }

    fn autoloaded(&self) -> Vec<(String, String)> {
        let mut options: Vec<(String, String)> = self
            .options
            .iter()
            .filter(|entry| entry.value().autoload)
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect();
        options.sort();
        options
    }
}
