//! Date and date/time field stages
//!
//! Backed by chrono. Marshal parses RFC 3339 (offset-aware), bare ISO-8601
//! date/times, plain dates, or a configured strftime format, and stores a
//! canonical string on the object. Date fields truncate the time component.

use crate::error::ErrorKind;
use crate::field::FieldKind;
use crate::session::Session;
use crate::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value;

const CANONICAL_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";
const CANONICAL_DATE: &str = "%Y-%m-%d";

enum Parsed {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
    DateOnly(NaiveDate),
}

impl Parsed {
    fn canonical(&self) -> String {
        match self {
            Parsed::Zoned(dt) => dt.to_rfc3339(),
            Parsed::Naive(dt) => dt.format(CANONICAL_DATETIME).to_string(),
            Parsed::DateOnly(d) => d.format(CANONICAL_DATE).to_string(),
        }
    }

    fn date(&self) -> NaiveDate {
        match self {
            Parsed::Zoned(dt) => dt.date_naive(),
            Parsed::Naive(dt) => dt.date(),
            Parsed::DateOnly(d) => *d,
        }
    }

    fn render(&self, format: &str) -> String {
        match self {
            Parsed::Zoned(dt) => dt.format(format).to_string(),
            Parsed::Naive(dt) => dt.format(format).to_string(),
            Parsed::DateOnly(d) => d.format(format).to_string(),
        }
    }
}

fn configured_format(kind: &FieldKind) -> Option<&str> {
    match kind {
        FieldKind::DateTime { format } | FieldKind::Date { format } => format.as_deref(),
        _ => None,
    }
}

fn parse_temporal(session: &Session) -> Result<Parsed> {
    let raw = session
        .data
        .as_str()
        .ok_or_else(|| session.field.invalid(ErrorKind::TypeError, &session.data))?
        .trim();

    if let Some(format) = configured_format(&session.field.kind) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Parsed::Naive(dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, format) {
            return Ok(Parsed::DateOnly(d));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Parsed::Zoned(dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Parsed::Naive(dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, CANONICAL_DATE) {
        return Ok(Parsed::DateOnly(d));
    }
    Err(session.field.invalid(ErrorKind::TypeError, &session.data))
}

/// Validation stage: parse and canonicalize the flowing date/time value.
pub fn parse(session: &mut Session) -> Result<()> {
    let parsed = parse_temporal(session)?;
    session.data = Value::String(parsed.canonical());
    Ok(())
}

/// Process stage for Date fields: drop the time component.
pub fn truncate_date(session: &mut Session) -> Result<()> {
    let parsed = parse_temporal(session)?;
    session.data = Value::String(parsed.date().format(CANONICAL_DATE).to_string());
    Ok(())
}

/// Serialize stage: render the attribute date/time as a string.
pub fn format_datetime(session: &mut Session) -> Result<()> {
    let parsed = parse_temporal(session)?;
    session.data = Value::String(match configured_format(&session.field.kind) {
        Some(format) => parsed.render(format),
        None => parsed.canonical(),
    });
    Ok(())
}

/// Serialize stage: render the attribute value as a date string.
pub fn format_date(session: &mut Session) -> Result<()> {
    let parsed = parse_temporal(session)?;
    session.data = Value::String(match configured_format(&session.field.kind) {
        Some(format) => parsed.date().format(format).to_string(),
        None => parsed.date().format(CANONICAL_DATE).to_string(),
    });
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

    #[test]
    fn test_parse_rfc3339() {
        let field = Field::new("at", FieldKind::datetime(), FieldOptions::new()).unwrap();
        let out = run_stage(&field, json!("2024-06-01T12:30:00+00:00"), parse).unwrap();
        assert_eq!(out, json!("2024-06-01T12:30:00+00:00"));
    }

    #[test]
    fn test_parse_naive_and_date_only() {
        let field = Field::new("at", FieldKind::datetime(), FieldOptions::new()).unwrap();
        assert_eq!(
            run_stage(&field, json!("2024-06-01T12:30:00"), parse).unwrap(),
            json!("2024-06-01T12:30:00")
        );
        assert_eq!(
            run_stage(&field, json!("2024-06-01"), parse).unwrap(),
            json!("2024-06-01")
        );
    }

    #[test]
    fn test_parse_configured_format() {
        let field = Field::new(
            "at",
            FieldKind::Date {
                format: Some("%d/%m/%Y".to_string()),
            },
            FieldOptions::new(),
        )
        .unwrap();
        assert_eq!(
            run_stage(&field, json!("01/06/2024"), parse).unwrap(),
            json!("2024-06-01")
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let field = Field::new("at", FieldKind::datetime(), FieldOptions::new()).unwrap();
        let err = run_stage(&field, json!("not a date"), parse).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldInvalid {
                kind: ErrorKind::TypeError,
                ..
            }
        ));
        assert!(run_stage(&field, json!(20240601), parse).is_err());
    }

    #[test]
    fn test_truncate_date() {
        let field = Field::new("on", FieldKind::date(), FieldOptions::new()).unwrap();
        assert_eq!(
            run_stage(&field, json!("2024-06-01T23:59:59+02:00"), truncate_date).unwrap(),
            json!("2024-06-01")
        );
    }

    #[test]
    fn test_format_datetime_custom() {
        let field = Field::new(
            "at",
            FieldKind::DateTime {
                format: Some("%d %b %Y %H:%M".to_string()),
            },
            FieldOptions::new(),
        )
        .unwrap();
        // A custom format applies on output; canonical forms still parse.
        let mut session_data = run_stage(&field, json!("2024-06-01T12:30:00"), format_datetime);
        // NaiveDateTime parse of custom format fails, falls through to ISO.
        assert_eq!(session_data.unwrap(), json!("01 Jun 2024 12:30"));
        session_data = run_stage(&field, json!("01 Jun 2024 12:30"), format_datetime);
        assert_eq!(session_data.unwrap(), json!("01 Jun 2024 12:30"));
    }

    #[test]
    fn test_format_date_default() {
        let field = Field::new("on", FieldKind::date(), FieldOptions::new()).unwrap();
        assert_eq!(
            run_stage(&field, json!("2024-06-01"), format_date).unwrap(),
            json!("2024-06-01")
        );
    }
}
