//! # Per-Column Validation
//!
//! One [`ColumnValidator`] is prepared per schema file and reused for
//! every record of the mapped column. Preparation does all schema-level
//! work up front, in a fixed order: parse placeholder, root shape,
//! type-registry pre-flight, engine compilation. A schema-level failure
//! is stored and replayed for every record, so each affected record is
//! individually counted and logged, exactly as a data-level failure
//! would be.

use serde_json::Value;

use crate::loader::SchemaDocument;
use crate::pointer::pointer_segments;
use crate::types::{self, PreflightFailure, TypeCheckFailure, TypeRegistry};

/// Message for a parsed schema whose root is neither an object nor a
/// boolean. Worded to match the engine's root-shape complaint so the
/// localizer's marker predicate recognizes both sources.
pub const ROOT_SHAPE_DEFECT_MESSAGE: &str = "schema root is not of type 'object', 'boolean'";

/// Result of validating one record instance against one schema.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// The record satisfies the schema.
    Valid,
    /// The record or the schema is defective; see the failure class.
    Invalid(ValidationFailure),
}

/// The failure classes, assigned structurally, never by message text.
#[derive(Debug, Clone)]
pub enum ValidationFailure {
    /// The record violates the schema's rules.
    Data(DataFailure),
    /// The schema is malformed or uncompilable.
    SchemaDefect {
        /// The engine's (or preparation's) description of the defect.
        message: String,
        /// Path segments into the schema document, when available.
        schema_path: Vec<String>,
    },
    /// The schema names a type outside the vocabulary.
    UnknownType(TypeCheckFailure),
    /// The schema names an admitted type with no registered checker.
    UndefinedTypeCheck(TypeCheckFailure),
    /// The schema file was not well-formed JSON.
    SchemaParse {
        /// The JSON parser's error description.
        message: String,
    },
}

/// Context carried by a data-level failure, everything the localizer
/// needs to compute the most specific location.
#[derive(Debug, Clone)]
pub struct DataFailure {
    /// The engine's human-readable message.
    pub message: String,
    /// Segments of the failing location within the record.
    pub instance_path: Vec<String>,
    /// Segments of the schema keyword that raised the failure.
    pub schema_path: Vec<String>,
    /// The offending instance value.
    pub instance: Value,
}

enum Prepared {
    Ready(jsonschema::Validator),
    Failed(ValidationFailure),
}

/// A validator prepared once per schema file.
pub struct ColumnValidator {
    prepared: Prepared,
}

impl ColumnValidator {
    /// Prepare the validator for a schema document.
    pub fn prepare(document: &SchemaDocument, registry: &TypeRegistry) -> Self {
        let prepared = match document {
            SchemaDocument::Unparsed { message, .. } => {
                Prepared::Failed(ValidationFailure::SchemaParse {
                    message: message.clone(),
                })
            }
            SchemaDocument::Parsed(schema) => Self::prepare_parsed(schema, registry),
        };
        Self { prepared }
    }

    fn prepare_parsed(schema: &Value, registry: &TypeRegistry) -> Prepared {
        if !schema.is_object() && !schema.is_boolean() {
            return Prepared::Failed(ValidationFailure::SchemaDefect {
                message: ROOT_SHAPE_DEFECT_MESSAGE.to_owned(),
                schema_path: Vec::new(),
            });
        }
        if let Err(failure) = types::preflight(schema, registry) {
            return Prepared::Failed(match failure {
                PreflightFailure::Unknown(failure) => ValidationFailure::UnknownType(failure),
                PreflightFailure::Unchecked(failure) => {
                    ValidationFailure::UndefinedTypeCheck(failure)
                }
            });
        }
        let mut options = jsonschema::options();
        options.with_draft(jsonschema::Draft::Draft202012);
        options.should_validate_formats(true);
        match options.build(schema) {
            Ok(validator) => Prepared::Ready(validator),
            Err(error) => {
                let schema_path = pointer_segments(&error.schema_path.to_string());
                Prepared::Failed(ValidationFailure::SchemaDefect {
                    message: error.to_string(),
                    schema_path,
                })
            }
        }
    }

    /// The stored schema-level failure, if preparation did not produce a
    /// usable validator.
    pub fn schema_failure(&self) -> Option<&ValidationFailure> {
        match &self.prepared {
            Prepared::Failed(failure) => Some(failure),
            Prepared::Ready(_) => None,
        }
    }

    /// Validate one record instance. Schema-level failures are replayed
    /// per record; otherwise the first engine error (in document order)
    /// is classified as a data failure.
    pub fn validate(&self, instance: &Value) -> ValidationOutcome {
        match &self.prepared {
            Prepared::Failed(failure) => ValidationOutcome::Invalid(failure.clone()),
            Prepared::Ready(validator) => match validator.iter_errors(instance).next() {
                None => ValidationOutcome::Valid,
                Some(error) => {
                    let message = error.to_string();
                    let instance_path = pointer_segments(&error.instance_path.to_string());
                    let schema_path = pointer_segments(&error.schema_path.to_string());
                    ValidationOutcome::Invalid(ValidationFailure::Data(DataFailure {
                        message,
                        instance_path,
                        schema_path,
                        instance: error.instance.into_owned(),
                    }))
                }
            },
        }
    }
}
