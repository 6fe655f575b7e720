//! Collection field stages
//!
//! A collection field applies a wrapped field to each element of an array.
//! Marshaling pairs input element *i* with existing element *i* by raw
//! position before delegating, so a wrapped nested field's in-place update
//! resolution applies per element. Element failures aggregate into a
//! one-slot-per-element error list; valid slots stay empty.

use crate::accessor;
use crate::error::{ErrorKind, ErrorNode};
use crate::field::{Field, FieldKind};
use crate::session::Session;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Configuration for a collection field.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// The field applied to each element.
    pub inner: Box<Field>,
    /// Optional key that must be unique across marshaled elements.
    pub unique_on: Option<String>,
}

impl CollectionConfig {
    pub fn new(inner: Field) -> Self {
        CollectionConfig {
            inner: Box::new(inner),
            unique_on: None,
        }
    }

    pub fn with_unique_on(mut self, key: impl Into<String>) -> Self {
        self.unique_on = Some(key.into());
        self
    }
}

/// Marshal process stage: apply the wrapped field to every element.
pub fn marshal(session: &mut Session) -> Result<()> {
    let field = session.field;
    let config = match &field.kind {
        FieldKind::Collection(config) => config,
        _ => return Ok(()),
    };

    let items = match session.data.as_array() {
        Some(items) => items.clone(),
        None => return Err(field.invalid(ErrorKind::TypeError, &session.data)),
    };

    // Existing elements pair with input elements by raw position.
    let existing_items: Vec<Value> = session
        .existing
        .take()
        .or_else(|| accessor::resolve(session.output, &field.source).cloned())
        .and_then(|value| value.as_array().cloned())
        .unwrap_or_default();

    let scope = session.scope;
    let mut results = Vec::with_capacity(items.len());
    let mut element_errors: Vec<Option<ErrorNode>> = Vec::with_capacity(items.len());
    let mut failed = false;

    for (i, element) in items.into_iter().enumerate() {
        let paired = existing_items.get(i).cloned().filter(|v| !v.is_null());
        match config.inner.marshal_value(scope, element, paired) {
            Ok(value) => {
                results.push(value);
                element_errors.push(None);
            }
            Err(err) => match err.into_field_payload() {
                Ok(node) => {
                    failed = true;
                    results.push(Value::Null);
                    element_errors.push(Some(node));
                }
                Err(fatal) => return Err(fatal),
            },
        }
    }

    if failed {
        return Err(Error::CollectionInvalid {
            field: field.name.clone(),
            elements: element_errors,
        });
    }

    if let Some(key) = &config.unique_on {
        let mut seen = HashSet::new();
        for result in &results {
            if let Some(value) = accessor::resolve(result, key) {
                if !seen.insert(value.to_string()) {
                    return Err(field.invalid(ErrorKind::Duplicates, value));
                }
            }
        }
    }

    session.data = Value::Array(results);
    Ok(())
}

/// Serialize process stage: map the wrapped field's serialize over each
/// element, independent of position pairing.
pub fn serialize(session: &mut Session) -> Result<()> {
    let field = session.field;
    let config = match &field.kind {
        FieldKind::Collection(config) => config,
        _ => return Ok(()),
    };

    let items = match session.data.as_array() {
        Some(items) => items.clone(),
        None => return Err(field.invalid(ErrorKind::TypeError, &session.data)),
    };

    let scope = session.scope;
    let mut results = Vec::with_capacity(items.len());
    for element in items {
        results.push(config.inner.serialize_value(scope, element)?);
    }
    session.data = Value::Array(results);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::nested::NestedConfig;
    use crate::mapper::MapperBuilder;
    use crate::options::FieldOptions;
    use crate::registry::Registry;
    use serde_json::json;

    fn registry_with_user() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                MapperBuilder::new("User")
                    .field("id", FieldKind::string(), FieldOptions::new())
                    .field("name", FieldKind::string(), FieldOptions::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    fn members_mapper(unique_on: Option<&str>) -> crate::mapper::Mapper {
        let inner = Field::new(
            "member",
            FieldKind::nested(NestedConfig::new("User").allow_create(true)),
            FieldOptions::new(),
        )
        .unwrap();
        let mut config = CollectionConfig::new(inner);
        if let Some(key) = unique_on {
            config = config.with_unique_on(key);
        }
        MapperBuilder::new("Team")
            .field("members", FieldKind::collection(config), FieldOptions::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_marshal_scalar_collection() {
        let registry = Registry::new();
        let inner = Field::new("tag", FieldKind::string(), FieldOptions::new()).unwrap();
        let mapper = MapperBuilder::new("Tags")
            .field(
                "tags",
                FieldKind::collection(CollectionConfig::new(inner)),
                FieldOptions::new(),
            )
            .build()
            .unwrap();
        let result = mapper
            .marshal(&registry, &json!({"tags": ["a", 2, true]}))
            .unwrap();
        assert_eq!(result, json!({"tags": ["a", "2", "true"]}));
    }

    #[test]
    fn test_marshal_requires_array() {
        let registry = Registry::new();
        let inner = Field::new("tag", FieldKind::string(), FieldOptions::new()).unwrap();
        let mapper = MapperBuilder::new("Tags")
            .field(
                "tags",
                FieldKind::collection(CollectionConfig::new(inner)),
                FieldOptions::new(),
            )
            .build()
            .unwrap();
        let err = mapper
            .marshal(&registry, &json!({"tags": "not-a-list"}))
            .unwrap_err();
        match err {
            Error::MappingInvalid { errors } => {
                assert!(matches!(errors.get("tags"), Some(ErrorNode::Message(_))));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_detection_on_unique_key() {
        let registry = registry_with_user();
        let mapper = members_mapper(Some("id"));
        let err = mapper
            .marshal(
                &registry,
                &json!({"members": [
                    {"id": "1", "name": "a"},
                    {"id": "1", "name": "b"},
                ]}),
            )
            .unwrap_err();
        match err {
            Error::MappingInvalid { errors } => {
                assert!(matches!(errors.get("members"), Some(ErrorNode::Message(_))));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let ok = mapper
            .marshal(
                &registry,
                &json!({"members": [
                    {"id": "1", "name": "a"},
                    {"id": "2", "name": "b"},
                ]}),
            )
            .unwrap();
        assert_eq!(ok["members"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_element_errors_one_slot_per_element() {
        let registry = registry_with_user();
        let mapper = members_mapper(None);
        let err = mapper
            .marshal(
                &registry,
                &json!({"members": [
                    {"id": "1", "name": "a"},
                    {"id": "2"},
                ]}),
            )
            .unwrap_err();
        match err {
            Error::MappingInvalid { errors } => match errors.get("members") {
                Some(ErrorNode::Elements(slots)) => {
                    assert_eq!(slots.len(), 2);
                    assert!(slots[0].is_none());
                    assert!(matches!(slots[1], Some(ErrorNode::Fields(_))));
                }
                other => panic!("unexpected payload: {:?}", other),
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_elements_pair_with_existing_by_position() {
        let registry = registry_with_user();
        let inner = Field::new(
            "member",
            FieldKind::nested(NestedConfig::new("User").allow_updates_in_place(true)),
            FieldOptions::new(),
        )
        .unwrap();
        let mapper = MapperBuilder::new("Team")
            .field(
                "members",
                FieldKind::collection(CollectionConfig::new(inner)),
                FieldOptions::new(),
            )
            .build()
            .unwrap();

        let target = json!({"members": [
            {"id": "1", "name": "a", "joined": "2020"},
            {"id": "2", "name": "b", "joined": "2021"},
        ]});
        let result = mapper
            .marshal_with(
                &registry,
                &json!({"members": [
                    {"id": "1", "name": "a2"},
                    {"id": "2", "name": "b2"},
                ]}),
                crate::mapper::MarshalOptions::new().with_target(target),
            )
            .unwrap();

        // Element i updates existing element i in place: marshaled fields
        // overwrite, unrelated attributes survive per slot.
        assert_eq!(
            result["members"],
            json!([
                {"id": "1", "name": "a2", "joined": "2020"},
                {"id": "2", "name": "b2", "joined": "2021"},
            ])
        );
    }

    #[test]
    fn test_serialize_maps_elements() {
        let registry = registry_with_user();
        let mapper = members_mapper(None);
        let output = mapper
            .serialize(
                &registry,
                &json!({"members": [{"id": "1", "name": "a", "extra": true}]}),
            )
            .unwrap();
        assert_eq!(output, json!({"members": [{"id": "1", "name": "a"}]}));
    }
}
