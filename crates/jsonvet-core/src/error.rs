//! # Shared Error Types

use thiserror::Error;

/// A dotted column spec from the run configuration could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpecError {
    /// The spec has no dot separating table and field.
    #[error("column spec '{0}' must be of the form table.field")]
    MissingDot(String),

    /// The table or field part of the spec is empty.
    #[error("column spec '{0}' has an empty table or field part")]
    EmptyPart(String),
}
