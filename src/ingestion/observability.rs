use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestionError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// A file was skipped because its document is malformed.
    Warning,
    /// A file could not be parsed.
    Error,
    /// I/O or directory traversal failure.
    Critical,
}

impl IngestionSeverity {
    /// Severity of a per-file failure.
    pub fn for_error(e: &IngestionError) -> Self {
        match e {
            IngestionError::Io { .. } | IngestionError::Walk(_) => Self::Critical,
            IngestionError::Rejected { .. } => Self::Warning,
            IngestionError::Json { .. }
            | IngestionError::Pattern(_)
            | IngestionError::InvalidSource { .. }
            | IngestionError::UnexpectedExtension { .. }
            | IngestionError::InvalidBundle { .. } => Self::Error,
        }
    }
}

/// Context about one file being added.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Row name of the file in the table.
    pub filename: String,
    /// Source the file came from (cache file, bundle or directory).
    pub source: PathBuf,
}

/// Table state reported after a file is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Row index assigned to the file.
    pub row: usize,
    /// Number of columns after the file was added.
    pub columns: usize,
    /// Whether the file introduced missing values.
    pub new_missing: bool,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a file is added to the table.
    fn on_file_added(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when a file is skipped or fails to load.
    fn on_file_rejected(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_file_rejected`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_file_rejected(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_file_added(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_file_added(ctx, stats);
        }
    }

    fn on_file_rejected(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_file_rejected(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs ingestion events to stderr.
///
/// Successful additions are only printed when `verbose` is set.
#[derive(Debug, Default)]
pub struct StdErrObserver {
    pub verbose: bool,
}

impl IngestionObserver for StdErrObserver {
    fn on_file_added(&self, ctx: &IngestionContext, stats: IngestionStats) {
        if self.verbose {
            eprintln!(
                "[aggregate][ok] file={} source={} row={} columns={} new_missing={}",
                ctx.filename,
                ctx.source.display(),
                stats.row,
                stats.columns,
                stats.new_missing
            );
        }
    }

    fn on_file_rejected(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[aggregate][{:?}] file={} source={} err={}",
            severity,
            ctx.filename,
            ctx.source.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[ALERT][aggregate][{:?}] file={} source={} err={}",
            severity,
            ctx.filename,
            ctx.source.display(),
            error
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_file_added(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok file={} source={} row={} columns={} new_missing={}",
            unix_ts(),
            ctx.filename,
            ctx.source.display(),
            stats.row,
            stats.columns,
            stats.new_missing
        ));
    }

    fn on_file_rejected(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} reject severity={:?} file={} source={} err={}",
            unix_ts(),
            severity,
            ctx.filename,
            ctx.source.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} file={} source={} err={}",
            unix_ts(),
            severity,
            ctx.filename,
            ctx.source.display(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::IngestionSeverity;
    use crate::error::{AggregationError, IngestionError};
    use std::path::PathBuf;

    #[test]
    fn every_severity_comes_from_a_failure() {
        let rejected = IngestionError::Rejected {
            filename: "F".to_string(),
            source: AggregationError::Frozen { filename: "F".to_string() },
        };
        let bundle = IngestionError::InvalidBundle { path: PathBuf::from("b.json") };
        let io = IngestionError::Io {
            path: PathBuf::from("x.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };

        assert_eq!(IngestionSeverity::for_error(&rejected), IngestionSeverity::Warning);
        assert_eq!(IngestionSeverity::for_error(&bundle), IngestionSeverity::Error);
        assert_eq!(IngestionSeverity::for_error(&io), IngestionSeverity::Critical);
        assert!(IngestionSeverity::Warning < IngestionSeverity::Error);
        assert!(IngestionSeverity::Error < IngestionSeverity::Critical);
    }
}
