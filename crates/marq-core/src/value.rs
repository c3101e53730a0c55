//! Runtime values and the population surface.

use std::collections::BTreeMap;

/// A populated member value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f32),
    Vec2([f32; 2]),
    Box4([f32; 4]),
    /// Resolved RGBA components in 0..=1.
    Color([f32; 4]),
    Text(String),
}

/// The object a population routine fills.
///
/// The host's real object model sits behind dependency injection and is out
/// of scope here; this is the minimal surface population code writes to.
#[derive(Debug, Clone)]
pub struct Instance {
    pub type_name: String,
    values: BTreeMap<String, Value>,
}

impl Instance {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, member: impl Into<String>, value: Value) {
        self.values.insert(member.into(), value);
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.values.get(member)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-population name-resolution scope: registered name -> type name.
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    names: BTreeMap<String, String>,
}

impl NameScope {
    pub fn register(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        self.names.insert(name.into(), type_name.into());
    }

    pub fn find(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Context handed to a population routine; built fresh per populate call.
#[derive(Debug, Clone, Default)]
pub struct PopulateContext {
    pub names: NameScope,
}
