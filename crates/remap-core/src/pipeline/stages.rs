//! Built-in generic stages
//!
//! Stages that are independent of any particular field kind: raw value
//! extraction with required/default/null policy, choice checking, constant
//! substitution, and the output writes. Kind-specific stages live with
//! their field kinds.

use crate::accessor;
use crate::error::ErrorKind;
use crate::field::FieldKind;
use crate::session::Session;
use crate::Result;
use serde_json::Value;

/// Input stage for marshaling: pull the raw value out of the input record
/// and apply the field's required/default/null policy.
///
/// An absent key and an explicit null are distinct: absence trips the
/// `required` check, an explicit null trips `allow_none`.
pub fn extract_input(session: &mut Session) -> Result<()> {
    let resolved = accessor::resolve(session.input, &session.field.name).cloned();
    match resolved {
        None => {
            if session.field.opts.required {
                return Err(session.field.invalid(ErrorKind::Required, &Value::Null));
            }
            session.data = session.field.opts.default.clone().unwrap_or(Value::Null);
        }
        Some(Value::Null) => {
            if !session.field.opts.allow_none {
                return Err(session.field.invalid(ErrorKind::NoneNotAllowed, &Value::Null));
            }
            session.data = Value::Null;
        }
        Some(value) => {
            session.data = value;
        }
    }
    Ok(())
}

/// Input stage for serialization: read the field's source attribute from
/// the domain object. Missing attributes fall back to the configured
/// default; serialization never raises required/null errors.
pub fn extract_attribute(session: &mut Session) -> Result<()> {
    session.data = accessor::resolve(session.input, &session.field.source)
        .cloned()
        .or_else(|| session.field.opts.default.clone())
        .unwrap_or(Value::Null);
    Ok(())
}

/// Membership check against the configured choice set.
pub fn check_choice(session: &mut Session) -> Result<()> {
    if let Some(choices) = &session.field.opts.choices {
        if !choices.contains(&session.data) {
            return Err(session
                .field
                .invalid(ErrorKind::InvalidChoice, &session.data));
        }
    }
    Ok(())
}

/// Substitute the static field's configured constant, regardless of input.
pub fn substitute_constant(session: &mut Session) -> Result<()> {
    if let FieldKind::Static { value } = &session.field.kind {
        session.data = value.clone();
    }
    Ok(())
}

/// Output stage for marshaling: write the processed value into the output
/// object at the field's source path.
pub fn write_source(session: &mut Session) -> Result<()> {
    let value = session.data.clone();
    accessor::set(session.output, &session.field.source, value)
}

/// Output stage for serialization: write the processed value into the
/// output mapping under the field's name, as a flat key.
pub fn write_name(session: &mut Session) -> Result<()> {
    if !session.output.is_object() {
        *session.output = Value::Object(serde_json::Map::new());
    }
    if let Some(map) = session.output.as_object_mut() {
        map.insert(session.field.name.clone(), session.data.clone());
    }
    Ok(())
}
