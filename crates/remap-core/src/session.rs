//! Per-invocation processing contexts
//!
//! A `Session` is the mutable context one field invocation runs in: the
//! value flowing through the pipeline, the whole-record input and output,
//! and the shared per-mapper scope. Sessions are created fresh per field per
//! mapper run and discarded when the field completes; nothing here outlives
//! the call stack that created it.

use crate::field::Field;
use crate::registry::Registry;
use crate::{Error, Result};
use serde_json::Value;

/// Upper bound on nested/collection descent.
///
/// The source design had no guard against cyclic object graphs; this limit
/// turns unbounded recursion into a fatal mapper error instead of a stack
/// overflow.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Shared per-mapper-invocation state, threaded through nested descent.
#[derive(Debug)]
pub struct MapperScope<'a> {
    /// Registry used to resolve nested mappers by name.
    pub registry: &'a Registry,
    /// Partial-update mode: fields absent from the input are skipped.
    pub partial: bool,
    /// Current nesting depth, incremented per nested/collection descent.
    pub depth: usize,
    /// Enclosing mapper scope, if this run was started by a nested field.
    pub parent: Option<&'a MapperScope<'a>>,
}

impl<'a> MapperScope<'a> {
    /// The scope for a top-level mapper invocation.
    pub fn root(registry: &'a Registry, partial: bool) -> Self {
        MapperScope {
            registry,
            partial,
            depth: 0,
            parent: None,
        }
    }

    /// Derive the scope for a nested mapper run, one level deeper.
    pub fn child(&'a self, partial: bool) -> Result<MapperScope<'a>> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::Mapper {
                message: format!(
                    "nesting depth limit of {} exceeded; cyclic object graph?",
                    MAX_NESTING_DEPTH
                ),
            });
        }
        Ok(MapperScope {
            registry: self.registry,
            partial,
            depth: self.depth + 1,
            parent: Some(self),
        })
    }
}

/// Mutable context for a single field invocation.
pub struct Session<'a> {
    /// The field being processed.
    pub field: &'a Field,
    /// The value flowing through the pipeline, reassigned at each stage.
    pub data: Value,
    /// The whole-record source.
    pub input: &'a Value,
    /// The whole-record destination.
    pub output: &'a mut Value,
    /// Paired/slot value hint used by nested and collection processing.
    pub existing: Option<Value>,
    /// Shared per-mapper state.
    pub scope: &'a MapperScope<'a>,
}

impl<'a> Session<'a> {
    pub fn new(
        field: &'a Field,
        input: &'a Value,
        output: &'a mut Value,
        scope: &'a MapperScope<'a>,
    ) -> Self {
        Session {
            field,
            data: Value::Null,
            input,
            output,
            existing: None,
            scope,
        }
    }
}
