//! Decimal field stages
//!
//! Fixed-point decimals backed by `rust_decimal`. Marshal parses from a
//! number or numeric string and quantizes to the configured precision,
//! storing the canonical string form on the object so no precision is lost
//! in the JSON value tree. Serialize re-quantizes and stringifies.

use crate::error::ErrorKind;
use crate::field::FieldKind;
use crate::session::Session;
use crate::Result;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

fn parse_decimal(session: &Session) -> Result<Decimal> {
    let parsed = match &session.data {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    parsed.ok_or_else(|| session.field.invalid(ErrorKind::TypeError, &session.data))
}

fn quantized(session: &Session, value: Decimal) -> Decimal {
    let precision = match session.field.kind {
        FieldKind::Decimal { precision } => precision,
        _ => return value,
    };
    let mut rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    rounded
}

/// Validation stage: parse the flowing value as a decimal.
pub fn parse(session: &mut Session) -> Result<()> {
    let value = parse_decimal(session)?;
    session.data = Value::String(value.normalize().to_string());
    Ok(())
}

/// Process stage: quantize to the configured precision.
pub fn quantize(session: &mut Session) -> Result<()> {
    let value = parse_decimal(session)?;
    session.data = Value::String(quantized(session, value).to_string());
    Ok(())
}

/// Serialize stage: quantize and stringify the attribute value.
pub fn format(session: &mut Session) -> Result<()> {
    let value = parse_decimal(session)?;
    session.data = Value::String(quantized(session, value).to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::options::FieldOptions;
    use crate::registry::Registry;
    use crate::session::MapperScope;
    use crate::Error;
    use serde_json::json;

    fn run_stage(
        field: &Field,
        data: Value,
        stage: fn(&mut Session) -> Result<()>,
    ) -> Result<Value> {
        let registry = Registry::new();
        let scope = MapperScope::root(&registry, false);
        let input = Value::Null;
        let mut output = Value::Null;
        let mut session = Session::new(field, &input, &mut output, &scope);
        session.data = data;
        stage(&mut session)?;
        Ok(session.data)
    }

    fn price_field(precision: u32) -> Field {
        Field::new("price", FieldKind::decimal(precision), FieldOptions::new()).unwrap()
    }

    #[test]
    fn test_parse_from_string_and_number() {
        let field = price_field(2);
        assert_eq!(run_stage(&field, json!("1.347"), parse).unwrap(), json!("1.347"));
        assert_eq!(run_stage(&field, json!(2.5), parse).unwrap(), json!("2.5"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let field = price_field(2);
        let err = run_stage(&field, json!("cheap"), parse).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldInvalid {
                kind: ErrorKind::TypeError,
                ..
            }
        ));
        assert!(run_stage(&field, json!([1]), parse).is_err());
    }

    #[test]
    fn test_quantize_rounds_midpoint_away_from_zero() {
        let field = price_field(2);
        assert_eq!(run_stage(&field, json!("1.347"), quantize).unwrap(), json!("1.35"));
        assert_eq!(run_stage(&field, json!("1.345"), quantize).unwrap(), json!("1.35"));
        assert_eq!(run_stage(&field, json!("-1.345"), quantize).unwrap(), json!("-1.35"));
    }

    #[test]
    fn test_quantize_pads_to_precision() {
        let field = price_field(2);
        assert_eq!(run_stage(&field, json!("1.3"), quantize).unwrap(), json!("1.30"));
        assert_eq!(run_stage(&field, json!(5), quantize).unwrap(), json!("5.00"));
    }

    #[test]
    fn test_format_matches_quantize() {
        let field = price_field(2);
        assert_eq!(run_stage(&field, json!(1.347), format).unwrap(), json!("1.35"));
    }
}
