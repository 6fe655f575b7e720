//! Field definitions
//!
//! A `Field` binds a resolved option set to a field kind and a pair of
//! prebuilt pipelines (marshal, serialize). Fields are created at mapper
//! definition time and immutable afterwards; each carries a monotonically
//! increasing creation-order index so iteration order is fixed independent
//! of storage order.

pub mod collection;
pub mod datetime;
pub mod decimal;
pub mod nested;
pub mod scalar;

use crate::error::ErrorKind;
use crate::options::FieldOptions;
use crate::pipeline::Pipeline;
use crate::session::Session;
use crate::{Error, Result};
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use collection::CollectionConfig;
pub use nested::{Getter, NestedConfig};

static CREATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The closed set of field kinds.
///
/// Kind-specific configuration lives on the variant; shared configuration
/// (required/null policy, defaults, choices, naming) lives on the field's
/// option set.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Text values, coerced from scalars, with optional length bounds.
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    /// Integer values parsed from numbers or numeric strings.
    Integer { min: Option<i64>, max: Option<i64> },
    /// Boolean values matched against configurable true/false token sets.
    Boolean {
        true_values: Vec<Value>,
        false_values: Vec<Value>,
    },
    /// Fixed-point decimals quantized to the configured precision.
    Decimal { precision: u32 },
    /// Date/time values, RFC 3339 or a configured strftime format.
    DateTime { format: Option<String> },
    /// Date values; time components are truncated on marshal.
    Date { format: Option<String> },
    /// A configured constant substituted in both directions.
    Static { value: Value },
    /// Delegation to another mapper, resolved by name through the registry.
    Nested(NestedConfig),
    /// Repeated application of a wrapped field over array elements.
    Collection(CollectionConfig),
}

impl FieldKind {
    pub fn string() -> Self {
        FieldKind::String {
            min_length: None,
            max_length: None,
        }
    }

    pub fn integer() -> Self {
        FieldKind::Integer {
            min: None,
            max: None,
        }
    }

    /// Boolean with the default true/false token sets.
    pub fn boolean() -> Self {
        FieldKind::Boolean {
            true_values: vec![json!(true), json!("true"), json!("yes"), json!("1"), json!("on"), json!(1)],
            false_values: vec![json!(false), json!("false"), json!("no"), json!("0"), json!("off"), json!(0)],
        }
    }

    pub fn decimal(precision: u32) -> Self {
        FieldKind::Decimal { precision }
    }

    pub fn datetime() -> Self {
        FieldKind::DateTime { format: None }
    }

    pub fn date() -> Self {
        FieldKind::Date { format: None }
    }

    pub fn static_value(value: Value) -> Self {
        FieldKind::Static { value }
    }

    pub fn nested(config: NestedConfig) -> Self {
        FieldKind::Nested(config)
    }

    pub fn collection(config: CollectionConfig) -> Self {
        FieldKind::Collection(config)
    }

    fn kind_name(&self) -> &'static str {
        match self {
            FieldKind::String { .. } => "String",
            FieldKind::Integer { .. } => "Integer",
            FieldKind::Boolean { .. } => "Boolean",
            FieldKind::Decimal { .. } => "Decimal",
            FieldKind::DateTime { .. } => "DateTime",
            FieldKind::Date { .. } => "Date",
            FieldKind::Static { .. } => "Static",
            FieldKind::Nested(_) => "Nested",
            FieldKind::Collection(_) => "Collection",
        }
    }
}

/// A single named, typed slot with its own transform pipelines.
#[derive(Clone)]
pub struct Field {
    /// Input/output key.
    pub name: String,
    /// Internal key.
    pub attribute_name: String,
    /// Owning-object attribute path (dotted, or the `__self__` sentinel).
    pub source: String,
    pub opts: FieldOptions,
    pub kind: FieldKind,
    /// Creation-order index fixing iteration order.
    pub index: u64,
    marshal_pipeline: Arc<Pipeline>,
    serialize_pipeline: Arc<Pipeline>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind.kind_name())
            .field("source", &self.source)
            .field("index", &self.index)
            .finish()
    }
}

impl Field {
    /// Create a field declared under `declared_name`.
    ///
    /// Resolves the option set's naming chain (explicit name →
    /// attribute_name → declared name; attribute_name defaults to the name,
    /// source to the attribute_name) and builds both static pipelines,
    /// merging any extra stages. Resolution failure and invalid option
    /// combinations are definition errors.
    pub fn new(declared_name: &str, kind: FieldKind, opts: FieldOptions) -> Result<Field> {
        let name = opts
            .name
            .clone()
            .or_else(|| opts.attribute_name.clone())
            .unwrap_or_else(|| declared_name.to_string());
        if name.is_empty() {
            return Err(Error::FieldDefinition {
                field: declared_name.to_string(),
                message: "field name could not be resolved".to_string(),
            });
        }
        let attribute_name = opts.attribute_name.clone().unwrap_or_else(|| name.clone());
        let source = opts.source.clone().unwrap_or_else(|| attribute_name.clone());

        validate_definition(&name, &kind, &opts)?;

        let marshal_pipeline = Pipeline::marshal_table(&kind).with_extra_stages(&opts.extra_stages);
        let serialize_pipeline = Pipeline::serialize_table(&kind)
            .with_extra_stages(&opts.extra_stages)
            .without_validation();

        Ok(Field {
            name,
            attribute_name,
            source,
            opts,
            kind,
            index: CREATION_COUNTER.fetch_add(1, Ordering::Relaxed),
            marshal_pipeline: Arc::new(marshal_pipeline),
            serialize_pipeline: Arc::new(serialize_pipeline),
        })
    }

    /// Run the marshal pipeline against a session.
    pub fn marshal(&self, session: &mut Session) -> Result<()> {
        self.marshal_pipeline.run(session)
    }

    /// Run the serialize pipeline against a session.
    pub fn serialize(&self, session: &mut Session) -> Result<()> {
        self.serialize_pipeline.run(session)
    }

    /// Marshal a single already-extracted value through this field's
    /// validation and process groups.
    ///
    /// Used by collection fields for per-element delegation; `existing` is
    /// the positionally paired element, consumed by a wrapped nested
    /// field's in-place resolution.
    pub fn marshal_value(
        &self,
        scope: &crate::session::MapperScope<'_>,
        value: Value,
        existing: Option<Value>,
    ) -> Result<Value> {
        let input = Value::Null;
        let mut scratch = Value::Null;
        let mut session = Session::new(self, &input, &mut scratch, scope);
        session.data = value;
        session.existing = existing;
        self.marshal_pipeline.run_transform_groups(&mut session)?;
        Ok(session.data)
    }

    /// Serialize a single value through this field's process group.
    pub fn serialize_value(
        &self,
        scope: &crate::session::MapperScope<'_>,
        value: Value,
    ) -> Result<Value> {
        let input = Value::Null;
        let mut scratch = Value::Null;
        let mut session = Session::new(self, &input, &mut scratch, scope);
        session.data = value;
        self.serialize_pipeline.run_transform_groups(&mut session)?;
        Ok(session.data)
    }

    /// Central error-construction hook for field-level failures.
    ///
    /// Every stage reports through here so message formatting stays uniform
    /// and per-field template overrides apply everywhere.
    pub fn invalid(&self, kind: ErrorKind, value: &Value) -> Error {
        Error::FieldInvalid {
            kind,
            field: self.name.clone(),
            message: self.opts.render_message(kind, &self.name, value),
        }
    }
}

fn validate_definition(name: &str, kind: &FieldKind, opts: &FieldOptions) -> Result<()> {
    if let Some(choices) = &opts.choices {
        if choices.is_empty() {
            return Err(Error::Options {
                message: format!("field '{}' declares an empty choice set", name),
            });
        }
    }
    match kind {
        FieldKind::Decimal { precision } if *precision > 28 => Err(Error::FieldDefinition {
            field: name.to_string(),
            message: format!("decimal precision {} exceeds the supported maximum of 28", precision),
        }),
        FieldKind::Boolean {
            true_values,
            false_values,
        } if true_values.is_empty() || false_values.is_empty() => Err(Error::FieldDefinition {
            field: name.to_string(),
            message: "boolean fields need at least one true and one false token".to_string(),
        }),
        FieldKind::Collection(config) if config.unique_on.as_deref() == Some("") => {
            Err(Error::FieldDefinition {
                field: name.to_string(),
                message: "unique_on key cannot be empty".to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_resolution_falls_back_to_declared() {
        let field = Field::new("title", FieldKind::string(), FieldOptions::new()).unwrap();
        assert_eq!(field.name, "title");
        assert_eq!(field.attribute_name, "title");
        assert_eq!(field.source, "title");
    }

    #[test]
    fn test_name_resolution_chain() {
        let field = Field::new(
            "declared",
            FieldKind::string(),
            FieldOptions::new()
                .with_name("wire_name")
                .with_source("meta.title"),
        )
        .unwrap();
        assert_eq!(field.name, "wire_name");
        assert_eq!(field.attribute_name, "wire_name");
        assert_eq!(field.source, "meta.title");
    }

    #[test]
    fn test_attribute_name_drives_name() {
        let field = Field::new(
            "declared",
            FieldKind::string(),
            FieldOptions::new().with_attribute_name("attr"),
        )
        .unwrap();
        assert_eq!(field.name, "attr");
        assert_eq!(field.source, "attr");
    }

    #[test]
    fn test_unresolvable_name_is_definition_error() {
        let err = Field::new("", FieldKind::string(), FieldOptions::new()).unwrap_err();
        assert!(matches!(err, Error::FieldDefinition { .. }));
    }

    #[test]
    fn test_empty_choices_rejected() {
        let err = Field::new(
            "status",
            FieldKind::string(),
            FieldOptions::new().with_choices(Vec::<Value>::new()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Options { .. }));
    }

    #[test]
    fn test_excessive_decimal_precision_rejected() {
        let err = Field::new("price", FieldKind::decimal(40), FieldOptions::new()).unwrap_err();
        assert!(matches!(err, Error::FieldDefinition { .. }));
    }

    #[test]
    fn test_creation_order_is_monotone() {
        let a = Field::new("a", FieldKind::string(), FieldOptions::new()).unwrap();
        let b = Field::new("b", FieldKind::string(), FieldOptions::new()).unwrap();
        assert!(a.index < b.index);
    }

    #[test]
    fn test_invalid_renders_template() {
        let field = Field::new(
            "age",
            FieldKind::integer(),
            FieldOptions::new().with_error_message(ErrorKind::TypeError, "{name} wants an integer, got {value}"),
        )
        .unwrap();
        let err = field.invalid(ErrorKind::TypeError, &json!("nope"));
        match err {
            Error::FieldInvalid { message, field, .. } => {
                assert_eq!(field, "age");
                assert_eq!(message, "age wants an integer, got nope");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
