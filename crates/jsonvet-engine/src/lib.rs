//! # jsonvet-engine — Batch Audit Orchestration
//!
//! Drives one audit run: for each schema-to-column mapping, fetch rows
//! and ids, augment each record, validate it, and route failures
//! through the localizer into the diagnostic sink. Fully sequential:
//! one mapping at a time, one record at a time, in source row order.
//!
//! All run-wide mutable state (counters, log file) lives in an explicit
//! [`RunContext`] owned by the single processing thread; there are no
//! ambient globals.

pub mod augment;
pub mod run;
pub mod sink;
pub mod source;

pub use run::{run_audit, EngineError, SchemaSource};
pub use sink::{DiagnosticSink, RunContext};
pub use source::{RowSource, SourceError};
