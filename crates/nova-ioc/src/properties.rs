//! String-keyed configuration values.

use std::collections::BTreeMap;
use std::sync::Arc;

pub trait PropertySource: Send + Sync {
    fn property(&self, name: &str) -> Option<String>;

    fn contains(&self, name: &str) -> bool {
        self.property(name).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapPropertySource {
    values: BTreeMap<String, String>,
}

impl MapPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl From<BTreeMap<String, String>> for MapPropertySource {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl PropertySource for MapPropertySource {
    fn property(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Several sources consulted in order; the first one defining a name wins.
#[derive(Clone, Default)]
pub struct LayeredPropertySource {
    layers: Vec<Arc<dyn PropertySource>>,
}

impl LayeredPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: Arc<dyn PropertySource>) {
        self.layers.push(source);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for LayeredPropertySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredPropertySource")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl PropertySource for LayeredPropertySource {
    fn property(&self, name: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.property(name))
    }
}
