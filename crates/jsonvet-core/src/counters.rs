//! # Run Counters
//!
//! Accounting for one audit run. Counters can only move through
//! [`RunCounters::record_valid`] and [`RunCounters::record_invalid`],
//! each of which bumps the total alongside its own bucket, so
//! `valid + invalid == total` holds by construction.

use std::fmt;

/// Mutable per-run counters, owned by the single processing thread.
#[derive(Debug, Default, Clone)]
pub struct RunCounters {
    total: u64,
    valid: u64,
    invalid: u64,
}

impl RunCounters {
    /// Fresh counters, all zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record as valid.
    pub fn record_valid(&mut self) {
        self.total += 1;
        self.valid += 1;
    }

    /// Count one record as invalid.
    pub fn record_invalid(&mut self) {
        self.total += 1;
        self.invalid += 1;
    }

    /// Snapshot the counters as an immutable summary.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total,
            valid: self.valid,
            invalid: self.invalid,
        }
    }
}

/// End-of-run totals surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records seen, including NULL-valued rows.
    pub total: u64,
    /// Records that passed validation or carried no data.
    pub valid: u64,
    /// Records that produced a diagnostic.
    pub invalid: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked {} records: {} valid, {} invalid",
            self.total, self.valid, self.invalid
        )
    }
}
