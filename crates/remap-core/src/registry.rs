//! Mapper registry
//!
//! An application-scoped table mapping mapper names to mapper definitions.
//! Registration happens once, during setup; lookups are read-only
//! thereafter. The name indirection lets a nested field reference a mapper
//! declared later: forward references resolve lazily at first use, with no
//! weak-reference machinery involved.

use crate::mapper::{Mapper, MarshalOptions};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Name → mapper table with registration-order iteration.
#[derive(Debug, Default)]
pub struct Registry {
    mappers: IndexMap<String, Arc<Mapper>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapper under its own name.
    ///
    /// Double registration under the same name is an error.
    pub fn register(&mut self, mapper: Mapper) -> Result<()> {
        let name = mapper.name().to_string();
        if self.mappers.contains_key(&name) {
            return Err(Error::Mapper {
                message: format!("mapper '{}' is already registered", name),
            });
        }
        self.mappers.insert(name, Arc::new(mapper));
        Ok(())
    }

    /// Resolve a mapper by name.
    pub fn get(&self, name: &str) -> Result<Arc<Mapper>> {
        self.mappers.get(name).cloned().ok_or_else(|| Error::Mapper {
            message: format!("no mapper registered under '{}'", name),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappers.contains_key(name)
    }

    /// Registered mapper names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mappers.keys().map(String::as_str)
    }

    /// Marshal through a registered mapper by name.
    pub fn marshal(&self, name: &str, data: &Value) -> Result<Value> {
        self.get(name)?.marshal(self, data)
    }

    /// Marshal through a registered mapper with explicit options.
    pub fn marshal_with(&self, name: &str, data: &Value, opts: MarshalOptions) -> Result<Value> {
        self.get(name)?.marshal_with(self, data, opts)
    }

    /// Serialize through a registered mapper by name.
    pub fn serialize(&self, name: &str, obj: &Value) -> Result<Value> {
        self.get(name)?.serialize(self, obj)
    }
}
