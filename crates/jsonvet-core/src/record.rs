//! # Record and Column Identifiers
//!
//! Newtype wrappers for the identifiers flowing through an audit run.
//! A `RecordId` cannot be confused with a table name, and a
//! `TableColumn` is always a validated `table` + `field` pair rather
//! than a bare dotted string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ColumnSpecError;

/// Identifier of one audited row.
///
/// Ids are fetched from the database as text and are only ever rendered
/// into diagnostics, so the representation stays opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    /// Access the textual form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A source column under audit: a table name plus the JSON-bearing field.
///
/// Parsed from the dotted `"table.field"` form used by the run
/// configuration. The table part may itself be schema-qualified
/// (`settings.users`), so the split happens at the *last* dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    table: String,
    field: String,
}

impl TableColumn {
    /// Parse a dotted column spec, e.g. `"settings.users.settings"`.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnSpecError`] when the spec has no dot or an empty
    /// table or field part.
    pub fn parse(spec: &str) -> Result<Self, ColumnSpecError> {
        let Some((table, field)) = spec.rsplit_once('.') else {
            return Err(ColumnSpecError::MissingDot(spec.to_owned()));
        };
        if table.is_empty() || field.is_empty() {
            return Err(ColumnSpecError::EmptyPart(spec.to_owned()));
        }
        Ok(Self {
            table: table.to_owned(),
            field: field.to_owned(),
        })
    }

    /// The table name, possibly schema-qualified.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The JSON-bearing field within the table.
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for TableColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_schema_qualified_column_at_last_dot() {
        let column = TableColumn::parse("settings.users.settings").unwrap();
        assert_eq!(column.table(), "settings.users");
        assert_eq!(column.field(), "settings");
        assert_eq!(column.to_string(), "settings.users.settings");
    }

    #[test]
    fn parses_plain_column() {
        let column = TableColumn::parse("users.config").unwrap();
        assert_eq!(column.table(), "users");
        assert_eq!(column.field(), "config");
    }

    #[test]
    fn rejects_spec_without_dot() {
        assert!(matches!(
            TableColumn::parse("users"),
            Err(ColumnSpecError::MissingDot(_))
        ));
    }

    #[test]
    fn rejects_empty_parts() {
        assert!(matches!(
            TableColumn::parse(".config"),
            Err(ColumnSpecError::EmptyPart(_))
        ));
        assert!(matches!(
            TableColumn::parse("users."),
            Err(ColumnSpecError::EmptyPart(_))
        ));
    }

    #[test]
    fn record_id_renders_bare() {
        assert_eq!(RecordId::from("42").to_string(), "42");
    }
}
