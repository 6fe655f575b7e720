//! Field processing pipelines
//!
//! A pipeline is an ordered sequence of stage groups (`input`, `validation`,
//! `process`, `output`), each holding single-responsibility stages that
//! transform the value flowing through a `Session`. The stage set is a
//! closed enum so nested/collection recursion stays exhaustive and
//! compiler-checked; user extension goes through the named `Custom` variant.
//!
//! Pipelines are static per field kind: the base stage table is built once
//! at field construction and shared across all invocations, with any extra
//! per-field stages merged in at that time, never at call time.

pub mod stages;

use crate::field::{collection, datetime, decimal, nested, scalar, FieldKind};
use crate::session::Session;
use crate::Result;
use std::collections::HashMap;

/// A user-supplied stage function.
pub type StageFn = fn(&mut Session) -> Result<()>;

/// The four stage groups, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageGroup {
    Input,
    Validation,
    Process,
    Output,
}

/// A single-responsibility transform over a `Session`.
///
/// Built-in stages read their configuration from the session's field (kind
/// parameters, option set); a stage signals failure by returning a
/// field-level error, which halts this field's pipeline but never the
/// owning mapper's loop.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Read the raw input value and apply required/default/null policy.
    Extract,
    /// Read the source attribute from the object being serialized.
    ExtractAttribute,
    /// Coerce scalars to text and check length bounds.
    CoerceString,
    /// Parse an integer from a number or numeric string, check bounds.
    ParseInteger,
    /// Check membership in the configured true/false value sets.
    MatchBoolean,
    /// Parse a fixed-point decimal from a number or string.
    ParseDecimal,
    /// Parse an ISO-8601 (or configured-format) date/time.
    ParseDateTime,
    /// Check membership in the configured choice set.
    CheckChoice,
    /// Map a recognized boolean token to a canonical bool.
    CanonicalizeBoolean,
    /// Quantize a decimal to the configured precision.
    QuantizeDecimal,
    /// Drop the time component of a parsed date/time.
    TruncateDate,
    /// Stringify a quantized decimal.
    FormatDecimal,
    /// Format a date/time for output.
    FormatDateTime,
    /// Format a date for output.
    FormatDate,
    /// Substitute the configured constant, even when the input is absent.
    SubstituteConstant,
    /// Delegate to the nested mapper's marshal (resolution policy applies).
    MarshalNested,
    /// Delegate to the nested mapper's serialize.
    SerializeNested,
    /// Marshal each element through the wrapped field.
    MarshalCollection,
    /// Serialize each element through the wrapped field.
    SerializeCollection,
    /// Write the processed value into the output at the field's source path.
    WriteSource,
    /// Write the processed value into the output at the field's name.
    WriteName,
    /// A named user stage.
    Custom {
        name: &'static str,
        run: StageFn,
        /// Execute even when the flowing value is null.
        runs_on_null: bool,
        /// Log and continue instead of halting the field on failure.
        optional: bool,
    },
}

impl Stage {
    /// Whether this stage executes when the flowing value is null.
    ///
    /// Input extraction and output writes always run; constant substitution
    /// must run to supply a value when the input is absent. Everything else
    /// skips on null so `required=false, allow_none=true` fields pass
    /// through validation untouched when absent.
    pub fn runs_on_null(&self) -> bool {
        match self {
            Stage::Extract
            | Stage::ExtractAttribute
            | Stage::SubstituteConstant
            | Stage::WriteSource
            | Stage::WriteName => true,
            Stage::Custom { runs_on_null, .. } => *runs_on_null,
            _ => false,
        }
    }

    /// Execute the stage against a session.
    pub fn run(&self, session: &mut Session) -> Result<()> {
        match self {
            Stage::Extract => stages::extract_input(session),
            Stage::ExtractAttribute => stages::extract_attribute(session),
            Stage::CheckChoice => stages::check_choice(session),
            Stage::CoerceString => scalar::coerce_string(session),
            Stage::ParseInteger => scalar::parse_integer(session),
            Stage::MatchBoolean => scalar::match_boolean(session),
            Stage::CanonicalizeBoolean => scalar::canonicalize_boolean(session),
            Stage::ParseDecimal => decimal::parse(session),
            Stage::QuantizeDecimal => decimal::quantize(session),
            Stage::FormatDecimal => decimal::format(session),
            Stage::ParseDateTime => datetime::parse(session),
            Stage::TruncateDate => datetime::truncate_date(session),
            Stage::FormatDateTime => datetime::format_datetime(session),
            Stage::FormatDate => datetime::format_date(session),
            Stage::SubstituteConstant => stages::substitute_constant(session),
            Stage::MarshalNested => nested::marshal(session),
            Stage::SerializeNested => nested::serialize(session),
            Stage::MarshalCollection => collection::marshal(session),
            Stage::SerializeCollection => collection::serialize(session),
            Stage::WriteSource => stages::write_source(session),
            Stage::WriteName => stages::write_name(session),
            Stage::Custom {
                name,
                run,
                optional,
                ..
            } => match run(session) {
                Ok(()) => Ok(()),
                Err(e) if *optional => {
                    log::warn!("optional stage '{}' failed: {}", name, e);
                    Ok(())
                }
                Err(e) => Err(e),
            },
        }
    }
}

/// Ordered stage groups a field's value flows through.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub input: Vec<Stage>,
    pub validation: Vec<Stage>,
    pub process: Vec<Stage>,
    pub output: Vec<Stage>,
}

impl Pipeline {
    /// The static marshal stage table for a field kind.
    pub fn marshal_table(kind: &FieldKind) -> Pipeline {
        match kind {
            FieldKind::String { .. } => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![Stage::CoerceString, Stage::CheckChoice],
                process: vec![],
                output: vec![Stage::WriteSource],
            },
            FieldKind::Integer { .. } => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![Stage::ParseInteger, Stage::CheckChoice],
                process: vec![],
                output: vec![Stage::WriteSource],
            },
            FieldKind::Boolean { .. } => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![Stage::MatchBoolean],
                process: vec![Stage::CanonicalizeBoolean],
                output: vec![Stage::WriteSource],
            },
            FieldKind::Decimal { .. } => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![Stage::ParseDecimal],
                process: vec![Stage::QuantizeDecimal],
                output: vec![Stage::WriteSource],
            },
            FieldKind::DateTime { .. } => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![Stage::ParseDateTime],
                process: vec![],
                output: vec![Stage::WriteSource],
            },
            FieldKind::Date { .. } => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![Stage::ParseDateTime],
                process: vec![Stage::TruncateDate],
                output: vec![Stage::WriteSource],
            },
            FieldKind::Static { .. } => Pipeline {
                input: vec![],
                validation: vec![],
                process: vec![Stage::SubstituteConstant],
                output: vec![Stage::WriteSource],
            },
            FieldKind::Nested(_) => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![],
                process: vec![Stage::MarshalNested],
                output: vec![Stage::WriteSource],
            },
            FieldKind::Collection(_) => Pipeline {
                input: vec![Stage::Extract],
                validation: vec![],
                process: vec![Stage::MarshalCollection],
                output: vec![Stage::WriteSource],
            },
        }
    }

    /// The static serialize stage table for a field kind.
    ///
    /// Serialization carries no validation group: the domain object is
    /// assumed to already satisfy its invariants.
    pub fn serialize_table(kind: &FieldKind) -> Pipeline {
        let process = match kind {
            FieldKind::Decimal { .. } => vec![Stage::FormatDecimal],
            FieldKind::DateTime { .. } => vec![Stage::FormatDateTime],
            FieldKind::Date { .. } => vec![Stage::FormatDate],
            FieldKind::Static { .. } => vec![Stage::SubstituteConstant],
            FieldKind::Nested(_) => vec![Stage::SerializeNested],
            FieldKind::Collection(_) => vec![Stage::SerializeCollection],
            _ => vec![],
        };
        let input = match kind {
            FieldKind::Static { .. } => vec![],
            _ => vec![Stage::ExtractAttribute],
        };
        Pipeline {
            input,
            validation: vec![],
            process,
            output: vec![Stage::WriteName],
        }
    }

    /// Merge per-field extra stages into this table, after the built-ins
    /// of the same group.
    pub fn with_extra_stages(mut self, extra: &HashMap<StageGroup, Vec<Stage>>) -> Pipeline {
        for (group, stages) in extra {
            let target = match group {
                StageGroup::Input => &mut self.input,
                StageGroup::Validation => &mut self.validation,
                StageGroup::Process => &mut self.process,
                StageGroup::Output => &mut self.output,
            };
            target.extend(stages.iter().cloned());
        }
        self
    }

    /// Strip groups that only apply to marshaling.
    pub fn without_validation(mut self) -> Pipeline {
        self.validation.clear();
        self
    }

    /// Run all groups in order against a session.
    ///
    /// Within a group, stages run strictly in list order, each receiving the
    /// previous stage's output as `session.data`. Stages are skipped while
    /// the flowing value is null unless they are flagged to run on null.
    pub fn run(&self, session: &mut Session) -> Result<()> {
        for group in [&self.input, &self.validation, &self.process, &self.output] {
            run_group(group, session)?;
        }
        Ok(())
    }

    /// Run only the validation and process groups over an already-extracted
    /// value. Collection fields use this to transform one element at a time
    /// without the whole-record extract/write stages.
    pub fn run_transform_groups(&self, session: &mut Session) -> Result<()> {
        for group in [&self.validation, &self.process] {
            run_group(group, session)?;
        }
        Ok(())
    }
}

fn run_group(stages: &[Stage], session: &mut Session) -> Result<()> {
    for stage in stages {
        if session.data.is_null() && !stage.runs_on_null() {
            continue;
        }
        stage.run(session)?;
    }
    Ok(())
}
