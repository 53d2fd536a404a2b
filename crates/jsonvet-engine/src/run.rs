//! # The Sequential Audit Loop
//!
//! One pass over every schema-to-column mapping: resolve the mapping,
//! prepare the validator, fetch rows, then process each record in
//! source order. All four failure classes are isolated per record or
//! per schema file; only supplier and log I/O failures halt the run.

use std::collections::BTreeMap;
use std::io;

use serde_json::Value;
use thiserror::Error;

use jsonvet_core::{ColumnSpecError, DiagnosticRecord, RunSummary, TableColumn};
use jsonvet_schema::{
    ColumnValidator, ErrorLocalizer, SchemaDocument, TypeRegistry, ValidationOutcome,
};

use crate::augment;
use crate::sink::RunContext;
use crate::source::{RowSource, SourceError};

/// One schema file's name and raw contents, as read from the schemas
/// directory.
#[derive(Debug, Clone)]
pub struct SchemaSource {
    /// File name including extension, e.g. `users.schema.json`.
    pub file_name: String,
    /// Raw file contents.
    pub text: String,
}

impl SchemaSource {
    /// The mapping key: the file name minus its extension.
    pub fn stem(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => &self.file_name,
        }
    }
}

/// Fatal conditions for an audit run. Everything else is isolated per
/// record or per schema file and lands in the diagnostic log instead.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A schema file has no entry in the schema-to-column mapping.
    #[error("no table mapping for schema file '{0}'")]
    UnmappedSchema(String),

    /// A mapping entry is not a valid dotted column spec.
    #[error("invalid column spec for schema file '{file}': {source}")]
    ColumnSpec {
        /// The schema file whose mapping entry is bad.
        file: String,
        /// The parse failure.
        source: ColumnSpecError,
    },

    /// The row supplier failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Ids and payloads for a table do not line up by position.
    #[error("{table}: ids and payloads misaligned ({ids} ids, {payloads} payloads)")]
    RowMisalignment {
        /// Table whose sequences disagree.
        table: String,
        /// Number of ids fetched.
        ids: usize,
        /// Number of payloads fetched.
        payloads: usize,
    },

    /// Type labels for an augmented table do not line up with its rows.
    #[error("{table}: type labels misaligned ({labels} labels, {rows} rows)")]
    LabelMisalignment {
        /// Table whose labels disagree.
        table: String,
        /// Number of labels fetched.
        labels: usize,
        /// Number of rows fetched.
        rows: usize,
    },

    /// The diagnostic log could not be written.
    #[error("diagnostic log write failed: {0}")]
    Log(#[from] io::Error),
}

/// Run the audit over every schema file, in input order. Returns the
/// final totals; diagnostics land in the context's sink.
pub fn run_audit(
    schemas: &[SchemaSource],
    mapping: &BTreeMap<String, String>,
    registry: &TypeRegistry,
    source: &mut dyn RowSource,
    ctx: &mut RunContext,
) -> Result<RunSummary, EngineError> {
    // The mapping must be total over the schema file set; verify before
    // touching any row.
    let mut resolved: Vec<(&SchemaSource, TableColumn)> = Vec::with_capacity(schemas.len());
    for schema in schemas {
        let spec = mapping
            .get(schema.stem())
            .ok_or_else(|| EngineError::UnmappedSchema(schema.file_name.clone()))?;
        let column = TableColumn::parse(spec).map_err(|source| EngineError::ColumnSpec {
            file: schema.file_name.clone(),
            source,
        })?;
        resolved.push((schema, column));
    }

    for (schema, column) in resolved {
        process_mapping(schema, &column, registry, source, ctx)?;
    }
    Ok(ctx.summary())
}

fn process_mapping(
    schema: &SchemaSource,
    column: &TableColumn,
    registry: &TypeRegistry,
    source: &mut dyn RowSource,
    ctx: &mut RunContext,
) -> Result<(), EngineError> {
    let document = SchemaDocument::parse(&schema.text);
    if let SchemaDocument::Unparsed { message, .. } = &document {
        tracing::error!(
            schema = %schema.file_name,
            %message,
            "schema file is not well-formed JSON"
        );
    }
    let validator = ColumnValidator::prepare(&document, registry);
    let localizer = ErrorLocalizer::new(&schema.file_name, &document);

    let payloads = source.payloads(column.table(), column.field())?;
    let ids = source.ids(column.table())?;
    if ids.len() != payloads.len() {
        return Err(EngineError::RowMisalignment {
            table: column.table().to_owned(),
            ids: ids.len(),
            payloads: payloads.len(),
        });
    }
    let labels = if augment::needs_labels(column.table()) {
        let labels = source.type_labels(column.table())?;
        if labels.len() != payloads.len() {
            return Err(EngineError::LabelMisalignment {
                table: column.table().to_owned(),
                labels: labels.len(),
                rows: payloads.len(),
            });
        }
        labels
    } else {
        Vec::new()
    };

    for (index, (id, payload)) in ids.iter().zip(&payloads).enumerate() {
        let Some(text) = payload else {
            // NULL column: nothing to validate.
            ctx.record_valid();
            continue;
        };
        let mut record: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(error) => {
                let diagnostic = DiagnosticRecord {
                    record_id: id.clone(),
                    column: column.clone(),
                    headline: format!("record is not well-formed JSON: {error}"),
                    detail: None,
                    extracted_object: None,
                };
                tracing::error!(id = %id, column = %column, "NOT VALID");
                ctx.record_invalid(&diagnostic)?;
                continue;
            }
        };
        if let Value::Object(fields) = &mut record {
            if let Some(label) = labels.get(index) {
                augment::augment(column.table(), fields, label);
            }
        }
        match validator.validate(&record) {
            ValidationOutcome::Valid => {
                tracing::info!(id = %id, column = %column, "VALID");
                ctx.record_valid();
            }
            ValidationOutcome::Invalid(failure) => {
                let diagnostic = localizer.localize(id, column, &failure, &record);
                tracing::error!(
                    id = %id,
                    column = %column,
                    error = %diagnostic.headline,
                    "NOT VALID"
                );
                ctx.record_invalid(&diagnostic)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use jsonvet_core::RecordId;
    use std::collections::HashMap;

    use crate::sink::DiagnosticSink;

    /// In-memory supplier: per table, aligned ids/payloads plus labels.
    #[derive(Default)]
    struct MemorySource {
        rows: HashMap<String, Vec<(String, Option<String>)>>,
        labels: HashMap<String, Vec<String>>,
    }

    impl MemorySource {
        fn with_rows(mut self, table: &str, rows: &[(&str, Option<&str>)]) -> Self {
            self.rows.insert(
                table.to_owned(),
                rows.iter()
                    .map(|(id, payload)| ((*id).to_owned(), payload.map(str::to_owned)))
                    .collect(),
            );
            self
        }

        fn with_labels(mut self, table: &str, labels: &[&str]) -> Self {
            self.labels.insert(
                table.to_owned(),
                labels.iter().map(|label| (*label).to_owned()).collect(),
            );
            self
        }
    }

    impl RowSource for MemorySource {
        fn payloads(
            &mut self,
            table: &str,
            _field: &str,
        ) -> Result<Vec<Option<String>>, SourceError> {
            Ok(self
                .rows
                .get(table)
                .map(|rows| rows.iter().map(|(_, payload)| payload.clone()).collect())
                .unwrap_or_default())
        }

        fn ids(&mut self, table: &str) -> Result<Vec<RecordId>, SourceError> {
            Ok(self
                .rows
                .get(table)
                .map(|rows| rows.iter().map(|(id, _)| RecordId(id.clone())).collect())
                .unwrap_or_default())
        }

        fn type_labels(&mut self, table: &str) -> Result<Vec<String>, SourceError> {
            Ok(self.labels.get(table).cloned().unwrap_or_default())
        }
    }

    fn context(dir: &tempfile::TempDir) -> RunContext {
        RunContext::new(DiagnosticSink::new(dir.path(), Local::now()))
    }

    fn schema_source(file_name: &str, text: &str) -> SchemaSource {
        SchemaSource {
            file_name: file_name.to_owned(),
            text: text.to_owned(),
        }
    }

    fn mapping(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    const WIDGET_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {"size": {"type": "integer"}},
        "required": ["size"]
    }"#;

    #[test]
    fn counts_balance_over_mixed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source = MemorySource::default().with_rows(
            "settings.widgets",
            &[
                ("1", Some(r#"{"size": 3}"#)),
                ("2", Some(r#"{"size": "big"}"#)),
                ("3", None),
                ("4", Some(r#"{"size": 5}"#)),
            ],
        );
        let schemas = [schema_source("widgets.schema.json", WIDGET_SCHEMA)];
        let map = mapping(&[("widgets.schema", "settings.widgets.config")]);
        let summary = run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.valid, 3);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.valid + summary.invalid, summary.total);
    }

    #[test]
    fn null_payload_counts_valid_without_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source =
            MemorySource::default().with_rows("settings.widgets", &[("1", None), ("2", None)]);
        // A schema no record could satisfy; NULL rows must still pass.
        let schemas = [schema_source("widgets.schema.json", r#"{"type": "object", "required": ["impossible"]}"#)];
        let map = mapping(&[("widgets.schema", "settings.widgets.config")]);
        let summary = run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.invalid, 0);
    }

    #[test]
    fn missing_mapping_key_is_fatal_before_any_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source = MemorySource::default()
            .with_rows("settings.widgets", &[("1", Some(r#"{"size": 3}"#))]);
        let schemas = [
            schema_source("widgets.schema.json", WIDGET_SCHEMA),
            schema_source("orphan.schema.json", WIDGET_SCHEMA),
        ];
        let map = mapping(&[("widgets.schema", "settings.widgets.config")]);
        let error = run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(error, EngineError::UnmappedSchema(file) if file == "orphan.schema.json"));
        // Nothing was processed.
        assert_eq!(ctx.summary().total, 0);
    }

    #[test]
    fn users_rows_are_augmented_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source = MemorySource::default()
            .with_rows(
                "settings.users",
                &[("1", Some(r#"{"name": "ada"}"#)), ("2", Some(r#"{"name": "bob"}"#))],
            )
            .with_labels("settings.users", &["admin", "guest"]);
        // user_type is schema-required; only augmentation can supply it.
        let schemas = [schema_source(
            "users.schema.json",
            r#"{
                "type": "object",
                "properties": {"user_type": {"type": "string"}},
                "required": ["user_type"]
            }"#,
        )];
        let map = mapping(&[("users.schema", "settings.users.settings")]);
        let summary = run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.invalid, 0);
    }

    #[test]
    fn label_misalignment_is_a_supplier_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source = MemorySource::default()
            .with_rows(
                "settings.users",
                &[("1", Some(r#"{"name": "ada"}"#)), ("2", Some(r#"{"name": "bob"}"#))],
            )
            .with_labels("settings.users", &["admin"]);
        let schemas = [schema_source("users.schema.json", r#"{"type": "object"}"#)];
        let map = mapping(&[("users.schema", "settings.users.settings")]);
        let error = run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(error, EngineError::LabelMisalignment { .. }));
    }

    #[test]
    fn malformed_payload_is_counted_invalid_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source = MemorySource::default().with_rows(
            "settings.widgets",
            &[("1", Some("{ broken")), ("2", Some(r#"{"size": 3}"#))],
        );
        let schemas = [schema_source("widgets.schema.json", WIDGET_SCHEMA)];
        let map = mapping(&[("widgets.schema", "settings.widgets.config")]);
        let summary = run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.valid, 1);
    }

    #[test]
    fn malformed_schema_degrades_to_per_record_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source = MemorySource::default().with_rows(
            "settings.widgets",
            &[("1", Some(r#"{"size": 3}"#)), ("2", None)],
        );
        let schemas = [schema_source("widgets.schema.json", "{ not json")];
        let map = mapping(&[("widgets.schema", "settings.widgets.config")]);
        let summary = run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap();
        // The non-null record is attributed to the broken schema; the
        // NULL row still counts valid.
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.valid, 1);
    }

    #[test]
    fn diagnostics_land_in_the_log_with_block_separators() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let mut source = MemorySource::default().with_rows(
            "settings.widgets",
            &[
                ("1", Some(r#"{"size": "big"}"#)),
                ("2", Some(r#"{"size": "bigger"}"#)),
            ],
        );
        let schemas = [schema_source("widgets.schema.json", WIDGET_SCHEMA)];
        let map = mapping(&[("widgets.schema", "settings.widgets.config")]);
        run_audit(
            &schemas,
            &map,
            &TypeRegistry::new(),
            &mut source,
            &mut ctx,
        )
        .unwrap();
        let (summary, path) = ctx.finish().unwrap();
        assert_eq!(summary.invalid, 2);
        let contents = std::fs::read_to_string(path.unwrap()).unwrap();
        assert!(contents.contains("Id: 1 settings.widgets.config\n"));
        assert!(contents.contains("Id: 2 settings.widgets.config\n"));
        assert_eq!(contents.matches("\n\n").count(), 2);
    }
}
