//! Error types for the Remap core library
//!
//! This module defines the error handling system for Remap, using thiserror
//! for ergonomic error definitions and anyhow for flexible error contexts.
//! Field-level failures (`FieldInvalid`, `MappingInvalid`,
//! `CollectionInvalid`) are caught by the mapper orchestrator and folded into
//! an aggregate payload; definition-time failures are fatal and never caught
//! at the record level.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Aggregated error payload keyed by field name, in declaration order.
pub type ErrorMap = IndexMap<String, ErrorNode>;

/// One node of an aggregate error payload.
///
/// The boundary shape is a mapping whose values are either a message (leaf
/// field error), a nested mapping (nested-mapper failure), or a list with one
/// slot per collection element (`null` where the element was valid).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorNode {
    /// A single field failed one check.
    Message(String),
    /// A nested mapper failed; payload keyed by the nested field names.
    Fields(ErrorMap),
    /// Collection-element failures, one slot per element.
    Elements(Vec<Option<ErrorNode>>),
}

/// The check a field-level error originated from.
///
/// Each kind has a default message template that can be overridden per field
/// through `FieldOptions::error_messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required value absent from the input.
    Required,
    /// Value has the wrong shape or cannot be parsed.
    TypeError,
    /// Nested object could not be resolved or created.
    NotFound,
    /// Explicit null where `allow_none` is false.
    NoneNotAllowed,
    /// Value not in the configured choice set.
    InvalidChoice,
    /// Duplicate value for a `unique_on` key across collection elements.
    Duplicates,
    /// Value outside configured length or numeric bounds.
    OutOfBounds,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Required => "required",
            ErrorKind::TypeError => "type_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NoneNotAllowed => "none_not_allowed",
            ErrorKind::InvalidChoice => "invalid_choice",
            ErrorKind::Duplicates => "duplicates",
            ErrorKind::OutOfBounds => "out_of_bounds",
        };
        write!(f, "{}", name)
    }
}

/// Main error type for Remap operations
#[derive(Error, Debug)]
pub enum Error {
    /// A single field's value failed one check during marshaling.
    #[error("Invalid field '{field}' ({kind}): {message}")]
    FieldInvalid {
        kind: ErrorKind,
        field: String,
        message: String,
    },

    /// Aggregate of field-level failures from one mapper run.
    #[error("Mapping failed for {} field(s): {}", errors.len(), field_list(errors))]
    MappingInvalid { errors: ErrorMap },

    /// Per-element failures from a collection field.
    #[error("Collection field '{field}' failed for {} element(s)", elements.iter().filter(|e| e.is_some()).count())]
    CollectionInvalid {
        field: String,
        elements: Vec<Option<ErrorNode>>,
    },

    /// Mapper-level definition or dispatch error
    #[error("Mapper error: {message}")]
    Mapper { message: String },

    /// Field definition error (invalid option combination, unresolved name)
    #[error("Field definition error for '{field}': {message}")]
    FieldDefinition { field: String, message: String },

    /// Field option set error
    #[error("Field options error: {message}")]
    Options { message: String },

    /// Invalid role combination or unknown role name
    #[error("Role error: {message}")]
    Role { message: String },

    /// Path write failed (traversal through a non-container node)
    #[error("Path error at '{path}': {message}")]
    Path { path: String, message: String },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

fn field_list(errors: &ErrorMap) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}

impl Error {
    /// Fold a field-level error into its aggregate payload node.
    ///
    /// Returns `Ok(node)` for the three catchable field-level variants and
    /// hands anything else back unchanged so definition-time errors keep
    /// propagating uncaught.
    pub fn into_field_payload(self) -> std::result::Result<ErrorNode, Error> {
        match self {
            Error::FieldInvalid { message, .. } => Ok(ErrorNode::Message(message)),
            Error::MappingInvalid { errors } => Ok(ErrorNode::Fields(errors)),
            Error::CollectionInvalid { elements, .. } => Ok(ErrorNode::Elements(elements)),
            other => Err(other),
        }
    }

    /// Whether this error is catchable at the record level.
    pub fn is_field_level(&self) -> bool {
        matches!(
            self,
            Error::FieldInvalid { .. }
                | Error::MappingInvalid { .. }
                | Error::CollectionInvalid { .. }
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
