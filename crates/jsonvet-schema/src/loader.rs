//! # Schema Loading
//!
//! Parses a schema file's raw text into a structured document. A file
//! that is not well-formed JSON does not abort the batch: the raw text
//! is retained as a placeholder so every dependent step can degrade to
//! a per-record diagnostic instead of crashing.

use serde_json::{Map, Value};

/// A schema file after the parse attempt.
#[derive(Debug, Clone)]
pub enum SchemaDocument {
    /// Well-formed JSON, ready for validator preparation.
    Parsed(Value),
    /// Malformed JSON. The raw text and the parse error are kept so the
    /// failure can be attributed per record downstream.
    Unparsed {
        /// The original file contents.
        text: String,
        /// The parser's description of the defect.
        message: String,
    },
}

impl SchemaDocument {
    /// Parse schema file contents. Never fails; malformed input yields
    /// the [`SchemaDocument::Unparsed`] placeholder.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self::Parsed(value),
            Err(error) => Self::Unparsed {
                text: text.to_owned(),
                message: error.to_string(),
            },
        }
    }

    /// The parsed schema value, when parsing succeeded.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Unparsed { .. } => None,
        }
    }

    /// The `$defs` map of named sub-schemas, when present.
    pub fn defs(&self) -> Option<&Map<String, Value>> {
        self.value()?.get("$defs")?.as_object()
    }
}
