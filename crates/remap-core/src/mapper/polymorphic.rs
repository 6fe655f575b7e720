//! Polymorphic dispatch
//!
//! A `PolymorphicMapper` selects a concrete mapper at call time based on a
//! discriminator value read from the record, then delegates the whole run
//! to that mapper. Variants register under a discriminator value and are
//! resolved by name through the registry. A missing or unregistered
//! discriminator is a fatal mapper error, not a field error.

use crate::accessor;
use crate::mapper::{Mapper, MarshalOptions};
use crate::registry::Registry;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Dispatch front over a family of mappers sharing a discriminator field.
#[derive(Debug, Clone)]
pub struct PolymorphicMapper {
    name: String,
    /// Key (dotted path allowed) holding the discriminator value.
    discriminator: String,
    /// Discriminator value → registered mapper name.
    variants: HashMap<String, String>,
}

impl PolymorphicMapper {
    pub fn new(name: impl Into<String>, discriminator: impl Into<String>) -> Self {
        PolymorphicMapper {
            name: name.into(),
            discriminator: discriminator.into(),
            variants: HashMap::new(),
        }
    }

    /// Register a concrete mapper name under a discriminator value.
    pub fn variant(mut self, value: impl Into<String>, mapper: impl Into<String>) -> Self {
        self.variants.insert(value.into(), mapper.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the concrete mapper driving the given record.
    pub fn dispatch(&self, registry: &Registry, record: &Value) -> Result<Arc<Mapper>> {
        let value = accessor::resolve(record, &self.discriminator)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Mapper {
                message: format!(
                    "polymorphic mapper '{}': discriminator '{}' missing from record",
                    self.name, self.discriminator
                ),
            })?;
        let mapper_name = self.variants.get(value).ok_or_else(|| Error::Mapper {
            message: format!(
                "polymorphic mapper '{}': no variant registered for '{}'",
                self.name, value
            ),
        })?;
        registry.get(mapper_name)
    }

    pub fn marshal(&self, registry: &Registry, data: &Value) -> Result<Value> {
        self.marshal_with(registry, data, MarshalOptions::new())
    }

    pub fn marshal_with(
        &self,
        registry: &Registry,
        data: &Value,
        opts: MarshalOptions,
    ) -> Result<Value> {
        self.dispatch(registry, data)?.marshal_with(registry, data, opts)
    }

    pub fn serialize(&self, registry: &Registry, obj: &Value) -> Result<Value> {
        self.serialize_with(registry, obj, None)
    }

    pub fn serialize_with(
        &self,
        registry: &Registry,
        obj: &Value,
        role: Option<&str>,
    ) -> Result<Value> {
        self.dispatch(registry, obj)?.serialize_with(registry, obj, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::mapper::MapperBuilder;
    use crate::options::FieldOptions;
    use serde_json::json;

    fn event_registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                MapperBuilder::new("ClickEvent")
                    .field("kind", FieldKind::string(), FieldOptions::new())
                    .field("target", FieldKind::string(), FieldOptions::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                MapperBuilder::new("ViewEvent")
                    .field("kind", FieldKind::string(), FieldOptions::new())
                    .field("url", FieldKind::string(), FieldOptions::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    fn events() -> PolymorphicMapper {
        PolymorphicMapper::new("Event", "kind")
            .variant("click", "ClickEvent")
            .variant("view", "ViewEvent")
    }

    #[test]
    fn test_dispatch_by_discriminator() {
        let registry = event_registry();
        let mapper = events();
        let click = mapper
            .marshal(&registry, &json!({"kind": "click", "target": "#buy"}))
            .unwrap();
        assert_eq!(click, json!({"kind": "click", "target": "#buy"}));

        let view = mapper
            .marshal(&registry, &json!({"kind": "view", "url": "/home"}))
            .unwrap();
        assert_eq!(view, json!({"kind": "view", "url": "/home"}));
    }

    #[test]
    fn test_missing_discriminator_is_fatal() {
        let registry = event_registry();
        let err = events()
            .marshal(&registry, &json!({"target": "#buy"}))
            .unwrap_err();
        assert!(matches!(err, Error::Mapper { .. }));
    }

    #[test]
    fn test_unregistered_discriminator_is_fatal() {
        let registry = event_registry();
        let err = events()
            .marshal(&registry, &json!({"kind": "scroll"}))
            .unwrap_err();
        assert!(matches!(err, Error::Mapper { .. }));
    }

    #[test]
    fn test_serialize_dispatches_too() {
        let registry = event_registry();
        let output = events()
            .serialize(&registry, &json!({"kind": "view", "url": "/home", "noise": 1}))
            .unwrap();
        assert_eq!(output, json!({"kind": "view", "url": "/home"}));
    }
}
