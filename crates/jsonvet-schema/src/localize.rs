//! # Error Localization
//!
//! Reduces a classified validation failure to the most specific
//! human-readable location: a field path, the smallest offending
//! sub-object, or a schema-authoring breadcrumb.
//!
//! Data-level failures are dispatched over four shapes in a fixed
//! precedence order that must not be reordered:
//!
//! 1. [`FailureShape::RootObject`] — the whole record is structurally
//!    wrong at the top level; the full instance is the evidence.
//! 2. [`FailureShape::DeepPath`] — the true offending leaf is nested;
//!    the record is walked to materialize its smallest enclosing
//!    container.
//! 3. [`FailureShape::Format`] — format failures report schema-side
//!    paths, so the field is resolved from the schema path, never the
//!    instance path.
//! 4. [`FailureShape::Leaf`] — a shallow failure named by its last path
//!    segment.
//!
//! Localization is pure: the same failure and record always produce
//! byte-identical diagnostic text.

use serde_json::Value;

use jsonvet_core::{DiagnosticRecord, RecordId, TableColumn};

use crate::loader::SchemaDocument;
use crate::types::TypeCheckFailure;
use crate::validator::{DataFailure, ValidationFailure};

/// Fixed generic diagnostic for a schema that is broken at the root:
/// the underlying message is too generic to localize further.
pub const SYNTAX_DEFECT_HEADLINE: &str =
    "syntax defect: unescaped special character, mismatched bracket, or a stray or missing comma";

/// Lexical marker the engine uses for "value is not a valid instance of
/// the expected type/format". This coupling to the engine's wording is
/// deliberate and isolated here: if an engine upgrade rewords its
/// messages, this predicate is the only thing to update.
const FORMAT_MISMATCH_MARKER: &str = "is not a ";

/// Marker for the engine's "schema root must be an object or boolean"
/// complaint.
const ROOT_SHAPE_MARKER: &str = "is not of type 'object', 'boolean'";

fn is_format_mismatch(message: &str) -> bool {
    message.contains(FORMAT_MISMATCH_MARKER)
}

fn is_root_shape_defect(message: &str) -> bool {
    message.contains(ROOT_SHAPE_MARKER)
}

/// The four data-failure shapes, in dispatch precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureShape {
    RootObject,
    DeepPath,
    Format,
    Leaf,
}

fn classify(failure: &DataFailure) -> FailureShape {
    if failure.instance_path.is_empty() && failure.instance.is_object() {
        return FailureShape::RootObject;
    }
    if failure.instance_path.len() >= 2 {
        return FailureShape::DeepPath;
    }
    if is_format_mismatch(&failure.message) {
        return FailureShape::Format;
    }
    FailureShape::Leaf
}

/// Localizes failures raised while auditing one schema file.
pub struct ErrorLocalizer<'a> {
    schema_file: &'a str,
    document: &'a SchemaDocument,
}

impl<'a> ErrorLocalizer<'a> {
    /// Build a localizer for one schema file and its parsed document.
    pub fn new(schema_file: &'a str, document: &'a SchemaDocument) -> Self {
        Self {
            schema_file,
            document,
        }
    }

    /// Compute the normalized diagnostic for a failure on one record.
    pub fn localize(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        failure: &ValidationFailure,
        record: &Value,
    ) -> DiagnosticRecord {
        match failure {
            ValidationFailure::Data(data) => self.localize_data(record_id, column, data, record),
            ValidationFailure::SchemaDefect {
                message,
                schema_path,
            } => self.localize_schema_defect(record_id, column, message, schema_path),
            ValidationFailure::UnknownType(failure) => {
                self.localize_type_failure(record_id, column, failure, "unknown type")
            }
            ValidationFailure::UndefinedTypeCheck(failure) => {
                self.localize_type_failure(record_id, column, failure, "no type check registered for")
            }
            ValidationFailure::SchemaParse { .. } => self.diagnostic(
                record_id,
                column,
                SYNTAX_DEFECT_HEADLINE.to_owned(),
                Some(self.schema_file.to_owned()),
                None,
            ),
        }
    }

    fn localize_data(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        failure: &DataFailure,
        record: &Value,
    ) -> DiagnosticRecord {
        match classify(failure) {
            FailureShape::RootObject => self.diagnostic(
                record_id,
                column,
                failure.message.clone(),
                None,
                Some(failure.instance.to_string()),
            ),
            FailureShape::DeepPath => self.localize_deep_path(record_id, column, failure, record),
            FailureShape::Format => self.localize_format(record_id, column, failure, record),
            FailureShape::Leaf => {
                let leaf = failure
                    .instance_path
                    .last()
                    .map(String::as_str)
                    .unwrap_or("(root)");
                self.diagnostic(
                    record_id,
                    column,
                    format!("'{leaf}': {}", failure.message),
                    None,
                    None,
                )
            }
        }
    }

    /// Walk the record through every path segment except the final leaf
    /// to materialize the leaf's smallest enclosing container.
    fn localize_deep_path(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        failure: &DataFailure,
        record: &Value,
    ) -> DiagnosticRecord {
        let Some((leaf, containers)) = failure.instance_path.split_last() else {
            return self.unresolvable(record_id, column, &failure.instance_path, &failure.message);
        };
        match container_at(record, containers) {
            Some(container) => self.diagnostic(
                record_id,
                column,
                format!("'{leaf}': {}", failure.message),
                None,
                Some(container.to_string()),
            ),
            None => self.unresolvable(record_id, column, &failure.instance_path, &failure.message),
        }
    }

    /// Format failures carry schema-side paths: the offending field name
    /// is the second-to-last schema-path segment, indexed into the
    /// record's top level.
    fn localize_format(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        failure: &DataFailure,
        record: &Value,
    ) -> DiagnosticRecord {
        let field = failure
            .schema_path
            .len()
            .checked_sub(2)
            .and_then(|index| failure.schema_path.get(index));
        match field.and_then(|name| record.get(name)) {
            Some(value) => self.diagnostic(
                record_id,
                column,
                format!(
                    "'{}' {}",
                    render_scalar(value),
                    format_description(&failure.message)
                ),
                None,
                None,
            ),
            None => self.unresolvable(record_id, column, &failure.schema_path, &failure.message),
        }
    }

    fn localize_schema_defect(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        message: &str,
        schema_path: &[String],
    ) -> DiagnosticRecord {
        if is_root_shape_defect(message) {
            return self.diagnostic(
                record_id,
                column,
                SYNTAX_DEFECT_HEADLINE.to_owned(),
                Some(self.schema_file.to_owned()),
                None,
            );
        }
        let take = schema_path.len().min(3);
        let breadcrumb = schema_path[schema_path.len() - take..].join(" -> ");
        let headline = if breadcrumb.is_empty() {
            message.to_owned()
        } else {
            format!("{breadcrumb}: {message}")
        };
        self.diagnostic(
            record_id,
            column,
            headline,
            Some(self.schema_file.to_owned()),
            None,
        )
    }

    fn localize_type_failure(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        failure: &TypeCheckFailure,
        kind: &str,
    ) -> DiagnosticRecord {
        let definition = self.enclosing_definition(&failure.type_name);
        let detail = if definition.is_empty() {
            self.schema_file.to_owned()
        } else {
            format!("{} -> {}", self.schema_file, definition)
        };
        self.diagnostic(
            record_id,
            column,
            format!("{kind} '{}' in {}", failure.type_name, failure.context),
            Some(detail),
            None,
        )
    }

    /// Find the named `$defs` entry enclosing the offending type name:
    /// the first entry (in map order) whose compact serialization
    /// contains the name as a substring. No match yields an empty name,
    /// never a failure.
    pub fn enclosing_definition(&self, type_name: &str) -> String {
        let Some(defs) = self.document.defs() else {
            return String::new();
        };
        defs.iter()
            .find(|(_, definition)| definition.to_string().contains(type_name))
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    }

    fn unresolvable(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        path: &[String],
        message: &str,
    ) -> DiagnosticRecord {
        self.diagnostic(
            record_id,
            column,
            format!("cannot resolve path '{}' in record: {message}", path.join(".")),
            None,
            None,
        )
    }

    fn diagnostic(
        &self,
        record_id: &RecordId,
        column: &TableColumn,
        headline: String,
        detail: Option<String>,
        extracted_object: Option<String>,
    ) -> DiagnosticRecord {
        DiagnosticRecord {
            record_id: record_id.clone(),
            column: column.clone(),
            headline,
            detail,
            extracted_object,
        }
    }
}

/// Descend through the given segments, treating numeric segments as
/// array indices. `None` when any segment fails to resolve.
fn container_at<'v>(record: &'v Value, segments: &[String]) -> Option<&'v Value> {
    let mut current = record;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Everything from the format marker onward, with `format` appended:
/// `"abc" is not a "date-time"` becomes `is not a "date-time" format`.
fn format_description(message: &str) -> String {
    let start = message.find(FORMAT_MISMATCH_MARKER).unwrap_or(0);
    format!("{} format", &message[start..])
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
