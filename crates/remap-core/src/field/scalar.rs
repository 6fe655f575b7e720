//! Scalar field stages: string, integer, boolean
//!
//! Coercion rules follow the usual string/number/boolean conversion matrix:
//! scalars coerce to text, integers parse from numbers or numeric strings,
//! booleans match configurable token sets before mapping to a canonical
//! bool.

use crate::error::ErrorKind;
use crate::field::FieldKind;
use crate::session::Session;
use crate::Result;
use serde_json::Value;

/// Coerce the flowing value to text and enforce length bounds.
pub fn coerce_string(session: &mut Session) -> Result<()> {
    let text = match &session.data {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(session.field.invalid(ErrorKind::TypeError, other)),
    };

    if let FieldKind::String {
        min_length,
        max_length,
    } = &session.field.kind
    {
        let len = text.chars().count();
        if min_length.map_or(false, |min| len < min)
            || max_length.map_or(false, |max| len > max)
        {
            return Err(session
                .field
                .invalid(ErrorKind::OutOfBounds, &Value::String(text)));
        }
    }

    session.data = Value::String(text);
    Ok(())
}

/// Parse the flowing value to an integer and enforce numeric bounds.
pub fn parse_integer(session: &mut Session) -> Result<()> {
    let parsed: Option<i64> = match &session.data {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                // Whole-valued floats are accepted; anything fractional or
                // outside the i64 range is not. The upper bound is strict:
                // i64::MAX as f64 rounds up to 2^63, one past i64::MAX.
                n.as_f64()
                    .filter(|f| {
                        f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                    })
                    .map(|f| f as i64)
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let value = match parsed {
        Some(i) => i,
        None => return Err(session.field.invalid(ErrorKind::TypeError, &session.data)),
    };

    if let FieldKind::Integer { min, max } = &session.field.kind {
        if min.map_or(false, |min| value < min) || max.map_or(false, |max| value > max) {
            return Err(session
                .field
                .invalid(ErrorKind::OutOfBounds, &Value::from(value)));
        }
    }

    session.data = Value::from(value);
    Ok(())
}

/// Check membership in the configured true/false token sets.
pub fn match_boolean(session: &mut Session) -> Result<()> {
    if let FieldKind::Boolean {
        true_values,
        false_values,
    } = &session.field.kind
    {
        if !true_values.contains(&session.data) && !false_values.contains(&session.data) {
            return Err(session.field.invalid(ErrorKind::TypeError, &session.data));
        }
    }
    Ok(())
}

/// Map a recognized boolean token to a canonical bool.
pub fn canonicalize_boolean(session: &mut Session) -> Result<()> {
    if let FieldKind::Boolean { true_values, .. } = &session.field.kind {
        session.data = Value::Bool(true_values.contains(&session.data));
    }
    Ok(())
}
