//! Nested field stages
//!
//! A nested field delegates its value to another mapper, resolved by name
//! through the registry so forward references work. Marshaling follows a
//! strict resolution order: a getter hit always wins over an in-place
//! update of the existing slot value, which wins over creation.

use crate::accessor;
use crate::error::ErrorKind;
use crate::field::FieldKind;
use crate::session::Session;
use crate::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Resolves an existing domain object from the incoming sub-data, e.g. by
/// looking up an id. Returning `None` means "nothing fetched", not an error.
pub type Getter = Arc<dyn Fn(&Value) -> Result<Option<Value>> + Send + Sync>;

/// Configuration for a nested field.
#[derive(Clone, Default)]
pub struct NestedConfig {
    /// Registered name of the mapper driving the nested value.
    pub mapper: String,
    /// Role to apply on the nested mapper, if any.
    pub role: Option<String>,
    pub getter: Option<Getter>,
    /// Marshal incoming sub-data into the getter's object.
    pub allow_updates: bool,
    /// Update the object already present at the target slot.
    pub allow_updates_in_place: bool,
    /// Construct a new sub-object when nothing can be resolved.
    pub allow_create: bool,
    /// Run the nested mapper in partial mode (implies in-place updates).
    pub allow_partial_updates: bool,
}

impl NestedConfig {
    pub fn new(mapper: impl Into<String>) -> Self {
        NestedConfig {
            mapper: mapper.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_getter(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn allow_updates(mut self, allow: bool) -> Self {
        self.allow_updates = allow;
        self
    }

    pub fn allow_updates_in_place(mut self, allow: bool) -> Self {
        self.allow_updates_in_place = allow;
        self
    }

    pub fn allow_create(mut self, allow: bool) -> Self {
        self.allow_create = allow;
        self
    }

    pub fn allow_partial_updates(mut self, allow: bool) -> Self {
        self.allow_partial_updates = allow;
        self
    }
}

impl fmt::Debug for NestedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedConfig")
            .field("mapper", &self.mapper)
            .field("role", &self.role)
            .field("getter", &self.getter.as_ref().map(|_| "<fn>"))
            .field("allow_updates", &self.allow_updates)
            .field("allow_updates_in_place", &self.allow_updates_in_place)
            .field("allow_create", &self.allow_create)
            .field("allow_partial_updates", &self.allow_partial_updates)
            .finish()
    }
}

/// Marshal process stage: resolve the target sub-object and delegate to the
/// nested mapper.
///
/// Resolution order is significant and evaluated exactly as listed:
/// 1. getter hit + `allow_updates` → update the fetched object
/// 2. getter hit → use the fetched object verbatim (by-reference link)
/// 3. existing slot value + (`allow_updates_in_place` or
///    `allow_partial_updates`) → update in place
/// 4. `allow_create` → construct a new sub-object
/// 5. otherwise → `not_found`
pub fn marshal(session: &mut Session) -> Result<()> {
    let field = session.field;
    let config = match &field.kind {
        FieldKind::Nested(config) => config,
        _ => return Ok(()),
    };
    let scope = session.scope;
    let mapper = scope.registry.get(&config.mapper)?;
    let data = session.data.clone();
    let role = config.role.as_deref();

    if let Some(getter) = &config.getter {
        if let Some(fetched) = getter(&data)? {
            if config.allow_updates {
                log::debug!("nested '{}': updating fetched object", field.name);
                let child = scope.child(config.allow_partial_updates)?;
                session.data = mapper.marshal_in(&child, &data, Some(fetched), role)?;
            } else {
                log::debug!("nested '{}': linking fetched object verbatim", field.name);
                session.data = fetched;
            }
            return Ok(());
        }
    }

    let existing = session
        .existing
        .take()
        .or_else(|| accessor::resolve(session.output, &field.source).cloned())
        .filter(|value| !value.is_null());

    if let Some(existing) = existing {
        if config.allow_updates_in_place || config.allow_partial_updates {
            log::debug!("nested '{}': updating slot object in place", field.name);
            let child = scope.child(config.allow_partial_updates)?;
            session.data = mapper.marshal_in(&child, &data, Some(existing), role)?;
            return Ok(());
        }
    }

    if config.allow_create {
        log::debug!("nested '{}': creating new object", field.name);
        let child = scope.child(config.allow_partial_updates)?;
        session.data = mapper.marshal_in(&child, &data, None, role)?;
        return Ok(());
    }

    Err(field.invalid(ErrorKind::NotFound, &data))
}

/// Serialize process stage: delegate to the nested mapper's serialize.
pub fn serialize(session: &mut Session) -> Result<()> {
    let field = session.field;
    let config = match &field.kind {
        FieldKind::Nested(config) => config,
        _ => return Ok(()),
    };
    let scope = session.scope;
    let mapper = scope.registry.get(&config.mapper)?;
    let child = scope.child(false)?;
    let obj = session.data.clone();
    session.data = mapper.serialize_in(&child, &obj, config.role.as_deref())?;
    Ok(())
}
