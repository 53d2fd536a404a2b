//! # Row Source Abstraction
//!
//! The engine is generic over where rows come from. A source returns,
//! per table, an ordered payload sequence, a positionally parallel id
//! sequence, and (for the augmented tables) an ordered type-label
//! sequence. Ordering between the sequences must correspond by
//! position; the engine verifies the lengths before processing.

use jsonvet_core::RecordId;
use thiserror::Error;

/// A failure inside the row supplier.
#[derive(Error, Debug)]
#[error("query against {table} failed: {reason}")]
pub struct SourceError {
    /// Table the query targeted.
    pub table: String,
    /// Driver-reported reason.
    pub reason: String,
}

/// Supplier of rows, ids, and type labels for one audit run.
pub trait RowSource {
    /// Raw JSON text of the audited field, one entry per row, `None`
    /// for NULL.
    fn payloads(&mut self, table: &str, field: &str) -> Result<Vec<Option<String>>, SourceError>;

    /// Row ids, positionally parallel to [`RowSource::payloads`].
    fn ids(&mut self, table: &str) -> Result<Vec<RecordId>, SourceError>;

    /// Type labels for the augmented tables, aligned by row position.
    /// Empty for tables that carry no labels.
    fn type_labels(&mut self, table: &str) -> Result<Vec<String>, SourceError>;
}
