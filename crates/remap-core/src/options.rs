//! Per-field configuration
//!
//! `FieldOptions` is the value object carrying everything configurable about
//! a single field: required/null policy, default value, read-only flag,
//! choice set, name/source mapping, per-kind error message templates, and
//! any extra pipeline stages to merge into the field's base stage tables.
//! Options are built once at mapper definition time and are read-only at
//! runtime.

use crate::error::ErrorKind;
use crate::pipeline::{Stage, StageGroup};
use serde_json::Value;
use std::collections::HashMap;

/// Per-field configuration, assembled with `with_*` builder methods.
///
/// The three naming knobs resolve at field construction: `name` is the
/// input/output key, `attribute_name` the internal key, `source` the
/// owning-object attribute path (dotted traversal or the `__self__`
/// sentinel). Each falls back to the previous one and ultimately to the
/// name the field was declared under.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    pub name: Option<String>,
    pub attribute_name: Option<String>,
    pub source: Option<String>,
    pub required: bool,
    pub default: Option<Value>,
    pub allow_none: bool,
    pub read_only: bool,
    pub choices: Option<Vec<Value>>,
    pub error_messages: HashMap<ErrorKind, String>,
    pub extra_stages: HashMap<StageGroup, Vec<Stage>>,
}

impl FieldOptions {
    /// Options with the default policy: required, null allowed.
    pub fn new() -> Self {
        FieldOptions {
            required: true,
            allow_none: true,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attribute_name(mut self, attribute_name: impl Into<String>) -> Self {
        self.attribute_name = Some(attribute_name.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_allow_none(mut self, allow_none: bool) -> Self {
        self.allow_none = allow_none;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_choices<I>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.choices = Some(choices.into_iter().collect());
        self
    }

    pub fn with_error_message(mut self, kind: ErrorKind, template: impl Into<String>) -> Self {
        self.error_messages.insert(kind, template.into());
        self
    }

    /// Append a user stage to one of the field's stage groups.
    ///
    /// Extra stages are merged into the base pipeline table once, at field
    /// construction, after the built-in stages of the same group.
    pub fn with_extra_stage(mut self, group: StageGroup, stage: Stage) -> Self {
        self.extra_stages.entry(group).or_default().push(stage);
        self
    }

    /// Render the message for an error kind, honoring per-field overrides.
    ///
    /// Templates may reference `{name}` and `{value}`.
    pub fn render_message(&self, kind: ErrorKind, name: &str, value: &Value) -> String {
        let template = self
            .error_messages
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| default_message(kind));
        let rendered_value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        template
            .replace("{name}", name)
            .replace("{value}", &rendered_value)
    }
}

/// Default message template for an error kind.
pub fn default_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Required => "This is a required field",
        ErrorKind::TypeError => "Invalid type for value '{value}'",
        ErrorKind::NotFound => "{name} not found",
        ErrorKind::NoneNotAllowed => "This field cannot be null",
        ErrorKind::InvalidChoice => "'{value}' is not a valid choice",
        ErrorKind::Duplicates => "Duplicate values found for '{name}'",
        ErrorKind::OutOfBounds => "Value '{value}' is out of bounds",
    }
}
