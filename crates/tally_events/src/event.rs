//! Event names, plugin names and the shared parameter container

use crate::error::EventError;
use compact_str::CompactString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a class of events, conventionally `Plugin.EventSuffix`
/// or `Plugin_EventSuffix`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(CompactString);

impl EventName {
    /// Create a new event name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(CompactString::new(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Split at the first `.` or `_` into `(namespace, suffix)`.
    ///
    /// Returns `None` when the name carries no separator.
    pub fn split(&self) -> Option<(&str, &str)> {
        let idx = self.0.find(|c: char| c == '.' || c == '_')?;
        Some((&self.0[..idx], &self.0[idx + 1..]))
    }

    /// Leading component, usually the name of the plugin that owns the event
    pub fn namespace(&self) -> Option<&str> {
        self.split().map(|(namespace, _)| namespace)
    }

    pub fn suffix(&self) -> Option<&str> {
        self.split().map(|(_, suffix)| suffix)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(CompactString::from(name))
    }
}

impl From<&EventName> for EventName {
    fn from(name: &EventName) -> Self {
        name.clone()
    }
}

/// Name of the plugin that owns an observer
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginName(CompactString);

impl PluginName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(CompactString::new(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PluginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PluginName {
    fn from(name: String) -> Self {
        Self(CompactString::from(name))
    }
}

/// Ordered argument list handed to every observer of a dispatch.
///
/// Observers receive it by `&mut`: whatever one observer changes is seen by
/// the observers after it and by the caller once dispatch returns. Each event
/// documents its own argument layout; arguments are plain JSON values with
/// typed access through serde.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventParameters {
    values: Vec<Value>,
}

impl EventParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a serializable argument
    pub fn push<T: Serialize>(&mut self, value: T) -> Result<(), EventError> {
        self.values.push(serde_json::to_value(value)?);
        Ok(())
    }

    /// Append a raw JSON argument
    pub fn push_value(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.values.get_mut(index)
    }

    /// Decode the argument at `index` into `T`
    pub fn get_as<T: DeserializeOwned>(&self, index: usize) -> Result<T, EventError> {
        let value = self.get(index).ok_or_else(|| Self::out_of_range(index, self.len()))?;
        Ok(T::deserialize(value)?)
    }

    /// Replace the argument at `index`
    pub fn set<T: Serialize>(&mut self, index: usize, value: T) -> Result<(), EventError> {
        let len = self.len();
        let slot = self.values.get_mut(index).ok_or_else(|| Self::out_of_range(index, len))?;
        *slot = serde_json::to_value(value)?;
        Ok(())
    }

    /// Read a named field of an object argument
    pub fn field(&self, index: usize, name: &str) -> Option<&Value> {
        self.get(index)?.as_object()?.get(name)
    }

    /// Insert or replace a named field of an object argument
    pub fn set_field<T: Serialize>(
        &mut self,
        index: usize,
        name: &str,
        value: T,
    ) -> Result<(), EventError> {
        let len = self.len();
        let slot = self.values.get_mut(index).ok_or_else(|| Self::out_of_range(index, len))?;
        let object = slot.as_object_mut().ok_or_else(|| {
            EventError::InvalidParameter(format!("argument {} is not an object", index))
        })?;
        object.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn out_of_range(index: usize, len: usize) -> EventError {
        EventError::InvalidParameter(format!("index {} out of range for {} argument(s)", index, len))
    }
}

impl From<Vec<Value>> for EventParameters {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for EventParameters {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_name_split() {
        let dotted = EventName::new("Site.created");
        assert_eq!(dotted.split(), Some(("Site", "created")));

        let underscored = EventName::from("Goals_addItems");
        assert_eq!(underscored.namespace(), Some("Goals"));
        assert_eq!(underscored.suffix(), Some("addItems"));

        // first separator wins, whichever kind it is
        let mixed = EventName::from("Menu.Admin_addItems");
        assert_eq!(mixed.split(), Some(("Menu", "Admin_addItems")));

        assert_eq!(EventName::from("bare").split(), None);
    }

    #[test]
    fn test_typed_parameter_access() {
        let mut params = EventParameters::new();
        params.push(5u32).unwrap();
        params.push("demo").unwrap();

        assert_eq!(params.get_as::<u32>(0).unwrap(), 5);
        assert_eq!(params.get_as::<String>(1).unwrap(), "demo");

        params.set(1, vec!["a", "b"]).unwrap();
        assert_eq!(params.get(1), Some(&json!(["a", "b"])));

        assert!(matches!(params.get_as::<u32>(7), Err(EventError::InvalidParameter(_))));
        assert!(matches!(params.get_as::<u32>(1), Err(EventError::Serialization(_))));
    }

    #[test]
    fn test_object_fields() {
        let mut params = EventParameters::from(vec![json!({ "siteId": 5 }), json!(3)]);

        params.set_field(0, "name", "demo").unwrap();
        assert_eq!(params.field(0, "siteId"), Some(&json!(5)));
        assert_eq!(params.field(0, "name"), Some(&json!("demo")));

        assert!(params.set_field(1, "name", "x").is_err());
        assert!(params.set_field(4, "name", "x").is_err());
    }
}
