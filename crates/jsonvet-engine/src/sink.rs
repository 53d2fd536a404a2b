//! # Diagnostic Sink and Run Context
//!
//! The sink owns the append-only diagnostic log. Its file name is keyed
//! by the run's start date and time, so repeated runs never interleave
//! or overwrite each other. The file is created lazily on the first
//! append; a fully valid run leaves no log behind.
//!
//! [`RunContext`] bundles the sink with the run counters and is passed
//! explicitly through the engine; recording a record moves exactly one
//! counter and, for failures, appends exactly one block.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use jsonvet_core::{DiagnosticRecord, RunCounters, RunSummary};

/// Append-only writer for diagnostic blocks.
#[derive(Debug)]
pub struct DiagnosticSink {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl DiagnosticSink {
    /// Create a sink whose log file is keyed by the run start time,
    /// e.g. `Errors_Logs_2026-08-05_14.03.59.txt` under `log_dir`.
    pub fn new(log_dir: &Path, started_at: DateTime<Local>) -> Self {
        let file_name = format!(
            "Errors_Logs_{}_{}.txt",
            started_at.format("%Y-%m-%d"),
            started_at.format("%H.%M.%S"),
        );
        Self {
            path: log_dir.join(file_name),
            file: None,
        }
    }

    /// Where the log will be (or has been) written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one rendered diagnostic block. Opens the file in append
    /// mode on first use; never rewrites prior content.
    pub fn append(&mut self, diagnostic: &DiagnosticRecord) -> io::Result<()> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(BufWriter::new(file));
        }
        if let Some(writer) = self.file.as_mut() {
            writer.write_all(diagnostic.render().as_bytes())?;
        }
        Ok(())
    }

    /// Flush and close, returning the log path if anything was written.
    pub fn finish(mut self) -> io::Result<Option<PathBuf>> {
        match self.file.take() {
            Some(mut writer) => {
                writer.flush()?;
                Ok(Some(self.path))
            }
            None => Ok(None),
        }
    }
}

/// Run-wide mutable state: counters plus the diagnostic log.
#[derive(Debug)]
pub struct RunContext {
    counters: RunCounters,
    sink: DiagnosticSink,
}

impl RunContext {
    /// Build the context around a sink; counters start at zero.
    pub fn new(sink: DiagnosticSink) -> Self {
        Self {
            counters: RunCounters::new(),
            sink,
        }
    }

    /// Count one record as valid.
    pub fn record_valid(&mut self) {
        self.counters.record_valid();
    }

    /// Count one record as invalid and append its diagnostic.
    pub fn record_invalid(&mut self, diagnostic: &DiagnosticRecord) -> io::Result<()> {
        self.counters.record_invalid();
        self.sink.append(diagnostic)
    }

    /// Snapshot the totals so far.
    pub fn summary(&self) -> RunSummary {
        self.counters.summary()
    }

    /// Finalize: flush the log and return the totals plus the log path
    /// if one was written.
    pub fn finish(self) -> io::Result<(RunSummary, Option<PathBuf>)> {
        let summary = self.counters.summary();
        let path = self.sink.finish()?;
        Ok((summary, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jsonvet_core::{RecordId, TableColumn};

    fn diagnostic(id: &str, headline: &str) -> DiagnosticRecord {
        DiagnosticRecord {
            record_id: RecordId::from(id),
            column: TableColumn::parse("settings.users.settings").unwrap(),
            headline: headline.to_owned(),
            detail: None,
            extracted_object: None,
        }
    }

    fn started_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 5, 14, 3, 59).unwrap()
    }

    #[test]
    fn log_name_is_keyed_by_start_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new(dir.path(), started_at());
        assert_eq!(
            sink.path().file_name().unwrap().to_str().unwrap(),
            "Errors_Logs_2026-08-05_14.03.59.txt"
        );
    }

    #[test]
    fn no_file_is_created_without_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new(dir.path(), started_at());
        let path = sink.path().to_path_buf();
        assert_eq!(sink.finish().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn appends_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DiagnosticSink::new(dir.path(), started_at());
        sink.append(&diagnostic("1", "first")).unwrap();
        sink.append(&diagnostic("2", "second")).unwrap();
        let path = sink.finish().unwrap().unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            contents,
            "Id: 1 settings.users.settings\nError: first\n\n\
             Id: 2 settings.users.settings\nError: second\n\n"
        );
    }

    #[test]
    fn context_counts_exactly_once_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = RunContext::new(DiagnosticSink::new(dir.path(), started_at()));
        context.record_valid();
        context.record_invalid(&diagnostic("1", "bad")).unwrap();
        context.record_valid();
        let (summary, path) = context.finish().unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.invalid, 1);
        assert!(path.is_some());
    }
}
