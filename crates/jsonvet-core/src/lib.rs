//! # jsonvet-core — Foundational Types
//!
//! Shared vocabulary for the jsonvet workspace: identifiers for the
//! records and table columns under audit, the normalized diagnostic
//! record that every failure is reduced to, and the run counters that
//! account for every processed row.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsonvet-*` crates (this is the leaf of
//!   the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod counters;
pub mod diagnostic;
pub mod error;
pub mod record;

pub use counters::{RunCounters, RunSummary};
pub use diagnostic::DiagnosticRecord;
pub use error::ColumnSpecError;
pub use record::{RecordId, TableColumn};
