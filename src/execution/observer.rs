use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { files: usize },
    FileFlattened { filename: String, cells: usize },
    FileFailed { filename: String, error: String },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
///
/// Flattening events arrive from worker threads in no particular order.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// A simple stderr logger for execution events.
#[derive(Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        eprintln!("[execute] {event:?}");
    }
}

/// Real-time counters for a parallel flattening run.
///
/// The engine updates these during execution; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,
    files_started: AtomicU64,
    files_flattened: AtomicU64,
    files_failed: AtomicU64,
    cells: AtomicU64,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            files_started: AtomicU64::new(0),
            files_flattened: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            cells: AtomicU64::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.files_started.store(0, Ordering::SeqCst);
        self.files_flattened.store(0, Ordering::SeqCst);
        self.files_failed.store(0, Ordering::SeqCst);
        self.cells.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_file_start(&self) {
        let _ = self.files_started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_file_flattened(&self, cells: usize) {
        let _ = self.files_flattened.fetch_add(1, Ordering::SeqCst);
        let _ = self.cells.fetch_add(cells as u64, Ordering::SeqCst);
    }

    pub fn on_file_failed(&self) {
        let _ = self.files_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            files_started: self.files_started.load(Ordering::SeqCst),
            files_flattened: self.files_flattened.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            cells: self.cells.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub files_started: u64,
    pub files_flattened: u64,
    pub files_failed: u64,
    pub cells: u64,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, files={}/{} (failed {}), cells={}, elapsed={:?}",
            self.run_id,
            self.files_flattened,
            self.files_started,
            self.files_failed,
            self.cells,
            self.elapsed
        )
    }
}
