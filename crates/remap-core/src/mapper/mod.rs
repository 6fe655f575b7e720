//! Mapper orchestration
//!
//! A `Mapper` holds an ordered collection of fields plus role definitions
//! and runs them against a shared input/output pair: `marshal` populates a
//! domain object from input data, `serialize` produces an output mapping
//! from a domain object. Field-level failures are collected without
//! aborting sibling fields and raised once, after every selected field
//! ran, as a single aggregate error.
//!
//! Mappers are built once through `MapperBuilder` (the declarative field
//! collector) and are immutable afterwards; instances of the per-call state
//! live on the call stack only.

pub mod polymorphic;

use crate::accessor;
use crate::error::ErrorMap;
use crate::field::{Field, FieldKind};
use crate::options::FieldOptions;
use crate::registry::Registry;
use crate::role::Role;
use crate::session::{MapperScope, Session};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub use polymorphic::PolymorphicMapper;

/// The role synthesized for every mapper: all declared fields.
pub const DEFAULT_ROLE: &str = "__default__";

/// Cross-field validation callback, invoked on the populated output after
/// per-field processing. Returned errors merge into the same aggregate as
/// field-level failures.
pub type ValidateHook = Arc<dyn Fn(&Value) -> std::result::Result<(), ErrorMap> + Send + Sync>;

/// Options for one marshal call.
#[derive(Default)]
pub struct MarshalOptions {
    /// Role selecting the active field subset; defaults to `__default__`.
    pub role: Option<String>,
    /// Partial-update mode: only fields present in the input are processed.
    pub partial: bool,
    /// Existing object to marshal into; a fresh object when absent.
    pub target: Option<Value>,
}

impl MarshalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn with_target(mut self, target: Value) -> Self {
        self.target = Some(target);
        self
    }
}

/// A declarative mapping between input representations and domain objects.
pub struct Mapper {
    name: String,
    fields: IndexMap<String, Field>,
    roles: HashMap<String, Role>,
    validate: Option<ValidateHook>,
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("roles", &self.roles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Mapper {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    fn resolve_role(&self, name: Option<&str>) -> Result<&Role> {
        let name = name.unwrap_or(DEFAULT_ROLE);
        self.roles.get(name).ok_or_else(|| Error::Role {
            message: format!("mapper '{}' has no role named '{}'", self.name, name),
        })
    }

    /// Marshal input data into a fresh domain object.
    pub fn marshal(&self, registry: &Registry, data: &Value) -> Result<Value> {
        self.marshal_with(registry, data, MarshalOptions::new())
    }

    /// Marshal input data with explicit role/partial/target options.
    pub fn marshal_with(
        &self,
        registry: &Registry,
        data: &Value,
        opts: MarshalOptions,
    ) -> Result<Value> {
        let scope = MapperScope::root(registry, opts.partial);
        self.marshal_in(&scope, data, opts.target, opts.role.as_deref())
    }

    pub(crate) fn marshal_in(
        &self,
        scope: &MapperScope<'_>,
        data: &Value,
        target: Option<Value>,
        role: Option<&str>,
    ) -> Result<Value> {
        let role = self.resolve_role(role)?;
        let mut output = target.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let mut errors = ErrorMap::new();

        for field in self.fields.values() {
            if !role.membership(&field.name) {
                continue;
            }
            if field.opts.read_only {
                continue;
            }
            if scope.partial && !accessor::exists(data, &field.name) {
                log::debug!(
                    "mapper '{}': partial update skips absent field '{}'",
                    self.name,
                    field.name
                );
                continue;
            }

            let mut session = Session::new(field, data, &mut output, scope);
            if let Err(err) = field.marshal(&mut session) {
                match err.into_field_payload() {
                    Ok(node) => {
                        errors.insert(field.name.clone(), node);
                    }
                    Err(fatal) => return Err(fatal),
                }
            }
        }

        if let Some(hook) = &self.validate {
            if let Err(extra) = hook(&output) {
                for (name, node) in extra {
                    errors.insert(name, node);
                }
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(Error::MappingInvalid { errors })
        }
    }

    /// Serialize a domain object into an output mapping with all fields.
    pub fn serialize(&self, registry: &Registry, obj: &Value) -> Result<Value> {
        self.serialize_with(registry, obj, None)
    }

    /// Serialize with an explicit role.
    pub fn serialize_with(
        &self,
        registry: &Registry,
        obj: &Value,
        role: Option<&str>,
    ) -> Result<Value> {
        let scope = MapperScope::root(registry, false);
        self.serialize_in(&scope, obj, role)
    }

    pub(crate) fn serialize_in(
        &self,
        scope: &MapperScope<'_>,
        obj: &Value,
        role: Option<&str>,
    ) -> Result<Value> {
        let role = self.resolve_role(role)?;
        let mut output = Value::Object(serde_json::Map::new());

        for field in self.fields.values() {
            if !role.membership(&field.name) {
                continue;
            }
            let mut session = Session::new(field, obj, &mut output, scope);
            field.serialize(&mut session)?;
        }

        Ok(output)
    }

    /// Marshal each record independently.
    ///
    /// Failure policy: each record aggregates its own field errors; one
    /// record's failure never stops or contaminates the others.
    pub fn marshal_many(
        &self,
        registry: &Registry,
        records: &[Value],
        role: Option<&str>,
    ) -> Vec<Result<Value>> {
        records
            .iter()
            .map(|record| {
                let scope = MapperScope::root(registry, false);
                self.marshal_in(&scope, record, None, role)
            })
            .collect()
    }

    /// Serialize each object independently.
    pub fn serialize_many(
        &self,
        registry: &Registry,
        objs: &[Value],
        role: Option<&str>,
    ) -> Vec<Result<Value>> {
        objs.iter()
            .map(|obj| self.serialize_with(registry, obj, role))
            .collect()
    }
}

/// Declarative field collector: gathers an ordered field set, roles, and
/// the cross-field validate hook into an immutable `Mapper`.
///
/// Fields keep declaration order; adding a field whose name already exists
/// (typically after `extend`) replaces the earlier definition **in place**,
/// preserving its position.
#[derive(Default)]
pub struct MapperBuilder {
    name: String,
    fields: Vec<Result<Field>>,
    roles: HashMap<String, Role>,
    validate: Option<ValidateHook>,
}

impl MapperBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        MapperBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Inherit all fields, roles, and the validate hook from a base mapper.
    ///
    /// Base fields come first; fields added afterwards with the same name
    /// override the base definition at the base's position.
    pub fn extend(mut self, base: &Mapper) -> Self {
        for field in base.fields.values() {
            self.fields.push(Ok(field.clone()));
        }
        for (name, role) in &base.roles {
            self.roles.insert(name.clone(), role.clone());
        }
        self.validate = base.validate.clone();
        self
    }

    /// Declare a field. Definition errors surface at `build()`.
    pub fn field(mut self, declared_name: &str, kind: FieldKind, opts: FieldOptions) -> Self {
        self.fields.push(Field::new(declared_name, kind, opts));
        self
    }

    /// Declare an already-constructed field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(Ok(field));
        self
    }

    pub fn role(mut self, name: impl Into<String>, role: Role) -> Self {
        self.roles.insert(name.into(), role);
        self
    }

    pub fn validate_with(mut self, hook: ValidateHook) -> Self {
        self.validate = Some(hook);
        self
    }

    pub fn build(self) -> Result<Mapper> {
        if self.name.is_empty() {
            return Err(Error::Mapper {
                message: "mapper name cannot be empty".to_string(),
            });
        }

        let mut fields = IndexMap::new();
        for field in self.fields {
            let field = field?;
            // IndexMap::insert keeps the original position on replacement,
            // which is exactly the override-in-place rule.
            fields.insert(field.name.clone(), field);
        }

        let mut roles = self.roles;
        roles
            .entry(DEFAULT_ROLE.to_string())
            .or_insert_with(Role::all_fields);

        Ok(Mapper {
            name: self.name,
            fields,
            roles,
            validate: self.validate,
        })
    }
}
