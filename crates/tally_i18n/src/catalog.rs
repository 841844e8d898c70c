//! Per-plugin translation tables

use crate::error::TranslationError;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Templates grouped by plugin, then by key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    plugins: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a nested `{"Plugin": {"Key": "template"}}` map
    pub fn from_json_str(json: &str) -> Result<Self, TranslationError> {
        let plugins: HashMap<String, HashMap<String, String>> = serde_json::from_str(json)?;
        Ok(Self { plugins })
    }

    /// Read a catalog file in the nested JSON layout
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, TranslationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        info!("🌐 Loaded {} translation(s) from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn insert(&mut self, plugin: impl Into<String>, key: impl Into<String>, template: impl Into<String>) {
        self.plugins
            .entry(plugin.into())
            .or_default()
            .insert(key.into(), template.into());
    }

    /// Merge another catalog into this one; entries from `other` win
    pub fn merge(&mut self, other: Catalog) {
        for (plugin, entries) in other.plugins {
            self.plugins.entry(plugin).or_default().extend(entries);
        }
    }

    pub fn get(&self, plugin: &str, key: &str) -> Option<&str> {
        self.plugins.get(plugin)?.get(key).map(String::as_str)
    }

    /// Total number of templates across all plugins
    pub fn len(&self) -> usize {
        self.plugins.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plugins that have at least one table, sorted
    pub fn plugins(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = r#"{
        "General": { "Settings": "Settings", "Visits": "%s visits" },
        "Goals": { "Goals": "Goals" }
    }"#;

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("General", "Visits"), Some("%s visits"));
        assert_eq!(catalog.get("Goals", "Missing"), None);
        assert_eq!(catalog.plugins(), vec!["General", "Goals"]);
    }

    #[test]
    fn test_invalid_json_is_catalog_error() {
        assert!(matches!(
            Catalog::from_json_str(r#"{"General": ["not", "a", "map"]}"#),
            Err(TranslationError::Catalog(_))
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = Catalog::from_json_str(CATALOG).unwrap();
        let mut overrides = Catalog::new();
        overrides.insert("General", "Settings", "Preferences");
        overrides.insert("Referrers", "Websites", "Websites");

        base.merge(overrides);
        assert_eq!(base.get("General", "Settings"), Some("Preferences"));
        assert_eq!(base.get("General", "Visits"), Some("%s visits"));
        assert_eq!(base.len(), 4);
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = Catalog::load_file(file.path()).unwrap();
        assert_eq!(catalog.get("Goals", "Goals"), Some("Goals"));

        assert!(Catalog::load_file("/definitely/not/here.json").is_err());
    }
}
