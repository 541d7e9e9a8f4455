//! Read-only view of the settings handed to plugins and the pipeline

use serde::Serialize;
use std::collections::BTreeMap;

use super::value::SettingValue;

/// Immutable `namespace -> value` snapshot of the settings registry.
///
/// Lookups of missing namespaces return neutral values (`false`, empty
/// list, `None`), which keeps plugin code free of registry plumbing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Config {
    values: BTreeMap<String, SettingValue>,
}

impl Config {
    pub fn new(values: BTreeMap<String, SettingValue>) -> Self {
        Self { values }
    }

    /// Builder method used mostly by tests and embedders
    pub fn with(mut self, namespace: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.values.insert(namespace.into(), value.into());
        self
    }

    pub fn get(&self, namespace: &str) -> Option<&SettingValue> {
        self.values.get(namespace)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.values.contains_key(namespace)
    }

    pub fn get_str(&self, namespace: &str) -> Option<&str> {
        self.get(namespace).and_then(SettingValue::as_str)
    }

    pub fn get_bool(&self, namespace: &str) -> bool {
        self.get(namespace)
            .and_then(SettingValue::as_bool)
            .unwrap_or(false)
    }

    pub fn get_int(&self, namespace: &str) -> Option<i64> {
        self.get(namespace).and_then(SettingValue::as_int)
    }

    pub fn get_list(&self, namespace: &str) -> &[String] {
        self.get(namespace)
            .and_then(SettingValue::as_list)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, SettingValue)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, SettingValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
