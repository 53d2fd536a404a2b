//! # Normalized Diagnostic Records
//!
//! Every validation failure, whatever its origin, is reduced to a
//! [`DiagnosticRecord`]: who failed (record id and column), the most
//! specific headline the localizer could compute, an optional
//! schema-side breadcrumb, and an optional extracted offending object.
//!
//! A record is write-once. Rendering is deterministic: the same record
//! always produces byte-identical text, so re-localizing the same
//! failure never changes the log.

use crate::record::{RecordId, TableColumn};

/// The normalized unit appended to the diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Identifier of the failing record.
    pub record_id: RecordId,
    /// The audited column the record came from.
    pub column: TableColumn,
    /// The most specific human-readable description of the failure.
    pub headline: String,
    /// Schema-side breadcrumb (schema file, optionally `-> definition`).
    /// Present only for schema-level failures; its presence selects the
    /// schema-error block layout.
    pub detail: Option<String>,
    /// Compact serialization of the offending object, when one was
    /// materialized.
    pub extracted_object: Option<String>,
}

impl DiagnosticRecord {
    /// Render the record as one log block, terminated by a blank line.
    ///
    /// Data-level failures:
    ///
    /// ```text
    /// Id: 7 settings.users.settings
    /// Error: 'age': "x" is not of type "integer"
    /// Object: {"age":"x"}
    /// ```
    ///
    /// Schema-level failures:
    ///
    /// ```text
    /// Id: 7
    /// Schema error: users.schema.json -> Account
    /// Error: unknown type 'strnig' in {"type":"strnig"}
    /// ```
    pub fn render(&self) -> String {
        let mut block = String::new();
        match &self.detail {
            Some(detail) => {
                block.push_str(&format!("Id: {}\n", self.record_id));
                block.push_str(&format!("Schema error: {detail}\n"));
                block.push_str(&format!("Error: {}\n", self.headline));
            }
            None => {
                block.push_str(&format!("Id: {} {}\n", self.record_id, self.column));
                block.push_str(&format!("Error: {}\n", self.headline));
                if let Some(object) = &self.extracted_object {
                    block.push_str(&format!("Object: {object}\n"));
                }
            }
        }
        block.push('\n');
        block
    }
}
