//! Parallel flattening with a sequential merge.
//!
//! Adding a file may create columns that must be backfilled against the exact number of files
//! already present, so the table itself is filled one file at a time. The expensive part (reading,
//! parsing and flattening each document) is independent per file and runs on a rayon pool; the
//! resulting [`FlatRecord`]s are then merged in a fixed order (input order for cache files,
//! filename order for in-memory documents), so row indices never depend on thread scheduling.

mod observer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde_json::Value;

use crate::aggregation::{Aggregator, FlatRecord};
use crate::config::HeuristicConfig;
use crate::error::{AggregationResult, IngestionError, IngestionResult};
use crate::ingestion::cache::{load_cache_file, row_name};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, StdErrExecutionObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { num_threads: Some(n) }
    }
}

/// A cache file read, parsed and flattened off the main thread.
#[derive(Debug)]
pub struct LoadedFile {
    /// The cache file.
    pub source: PathBuf,
    /// Row name of the file.
    pub filename: String,
    /// The flattened document, or why it could not be produced.
    pub record: IngestionResult<FlatRecord>,
}

/// Thread pool for flattening many documents at once.
pub struct ExecutionEngine {
    pool: ThreadPool,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads == Some(0)` or the thread pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> Self {
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .expect("failed to build rayon thread pool");

        Self {
            pool,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Flatten in-memory documents in parallel. Results are in input order.
    pub fn flatten_parallel(
        &self,
        documents: &[(String, Value)],
        config: &HeuristicConfig,
    ) -> Vec<(String, AggregationResult<FlatRecord>)> {
        self.run(documents.len(), || {
            documents
                .par_iter()
                .map(|(filename, document)| {
                    self.metrics.on_file_start();
                    let record = FlatRecord::from_document(document, config);
                    self.observe(filename, record.as_ref().map(FlatRecord::len).map_err(|e| e.to_string()));
                    (filename.clone(), record)
                })
                .collect()
        })
    }

    /// Read, parse and flatten cache files in parallel.
    ///
    /// Results are in input order, so merging them matches a sequential pass over `paths`.
    pub fn load_parallel(&self, paths: &[PathBuf], extensions: &[String], config: &HeuristicConfig) -> Vec<LoadedFile> {
        self.run(paths.len(), || {
            paths
                .par_iter()
                .map(|path| {
                    self.metrics.on_file_start();
                    let (filename, record) = match load_cache_file(path, extensions) {
                        Ok((filename, document)) => {
                            let record = FlatRecord::from_document(&document, config).map_err(|source| {
                                IngestionError::Rejected {
                                    filename: filename.clone(),
                                    source,
                                }
                            });
                            (filename, record)
                        }
                        Err(e) => (row_name(path), Err(e)),
                    };
                    self.observe(&filename, record.as_ref().map(FlatRecord::len).map_err(|e| e.to_string()));
                    LoadedFile {
                        source: path.clone(),
                        filename,
                        record,
                    }
                })
                .collect()
        })
    }

    /// Flatten `documents` in parallel, then merge them into `aggregator` in filename order.
    ///
    /// Returns one outcome per document, in merge order. A document that fails to flatten is
    /// skipped; the others are still merged.
    pub fn aggregate_documents(
        &self,
        documents: &[(String, Value)],
        aggregator: &mut Aggregator,
    ) -> Vec<(String, AggregationResult<bool>)> {
        let flattened = self.flatten_parallel(documents, aggregator.config());
        self.merge_into(aggregator, flattened)
    }

    /// Merge flattened records into `aggregator` one at a time, in filename order.
    pub fn merge_into(
        &self,
        aggregator: &mut Aggregator,
        mut records: Vec<(String, AggregationResult<FlatRecord>)>,
    ) -> Vec<(String, AggregationResult<bool>)> {
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
            .into_iter()
            .map(|(filename, record)| {
                let outcome = record.and_then(|r| aggregator.merge(filename.clone(), r));
                (filename, outcome)
            })
            .collect()
    }

    fn run<T, F>(&self, files: usize, job: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { files });

        let out = self.pool.install(job);

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        out
    }

    fn observe(&self, filename: &str, outcome: Result<usize, String>) {
        match outcome {
            Ok(cells) => {
                self.metrics.on_file_flattened(cells);
                self.emit(ExecutionEvent::FileFlattened {
                    filename: filename.to_string(),
                    cells,
                });
            }
            Err(error) => {
                self.metrics.on_file_failed();
                self.emit(ExecutionEvent::FileFailed {
                    filename: filename.to_string(),
                    error,
                });
            }
        }
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
