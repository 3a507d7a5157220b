//! Island catalog and serialized props

use crate::marker::IslandRef;
use crate::RuntimeResult;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A client component that can take over an island
pub trait IslandComponent: fmt::Debug {
    fn name(&self) -> &str;
}

/// Component known only by name; renderers dispatch on `name()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedComponent {
    name: String,
}

impl NamedComponent {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl IslandComponent for NamedComponent {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Island id -> export name -> component
#[derive(Debug, Default)]
pub struct IslandCatalog {
    islands: HashMap<String, HashMap<String, Rc<dyn IslandComponent>>>,
}

impl IslandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under `id` / `export_name`
    pub fn register(&mut self, id: &str, export_name: &str, component: impl IslandComponent + 'static) {
        self.islands
            .entry(id.to_string())
            .or_default()
            .insert(export_name.to_string(), Rc::new(component));
    }

    /// Builder-style `register`
    pub fn with(mut self, id: &str, export_name: &str, component: impl IslandComponent + 'static) -> Self {
        self.register(id, export_name, component);
        self
    }

    pub fn resolve(&self, island: &IslandRef) -> Option<Rc<dyn IslandComponent>> {
        self.islands.get(&island.id)?.get(&island.export_name).cloned()
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.islands.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serialized props, indexed by an island marker's props index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IslandProps {
    props: Vec<Value>,
}

impl IslandProps {
    pub fn new(props: Vec<Value>) -> Self {
        Self { props }
    }

    /// Parse a JSON array of props objects
    pub fn from_json(json: &str) -> RuntimeResult<Self> {
        Ok(Self { props: serde_json::from_str(json)? })
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.props.get(index)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}
