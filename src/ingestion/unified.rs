//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_sources`], which enumerates every source, flattens each file
//! and merges it into an [`Aggregator`].
//!
//! A source is one of:
//!
//! - a directory, walked recursively for cache files (see [`WalkOptions`])
//! - a file, read as a pre-aggregated bundle of `filename -> document`
//! - `@manifest`, a text file listing directories and single cache files
//!
//! If an [`IngestionObserver`] is provided, additions, rejections and alerts are reported to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::aggregation::{Aggregator, FlatRecord};
use crate::error::{AggregationError, IngestionError, IngestionResult};
use crate::execution::ExecutionEngine;

use super::bundle::load_bundle;
use super::cache::{load_cache_file, row_name};
use super::manifest::read_manifest;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::walk::{walk_cache_files, WalkOptions};

/// One command-line style source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A directory to walk, or a bundle file.
    Path(PathBuf),
    /// A manifest listing directories and cache files.
    Manifest(PathBuf),
}

impl Source {
    /// Parse a source argument; a leading `@` marks a manifest.
    pub fn parse(arg: &str) -> Self {
        match arg.strip_prefix('@') {
            Some(manifest) => Self::Manifest(PathBuf::from(manifest)),
            None => Self::Path(PathBuf::from(arg)),
        }
    }
}

impl FromStr for Source {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Manifest(p) => write!(f, "@{}", p.display()),
        }
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Directory walk filters; its extension list also applies to manifest entries.
    pub walk: WalkOptions,
    /// Abort on the first rejected file instead of skipping it.
    pub fail_fast: bool,
    /// Flatten files on this engine's thread pool. Sequential when `None`.
    pub engine: Option<Arc<ExecutionEngine>>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("walk", &self.walk)
            .field("fail_fast", &self.fail_fast)
            .field("engine_set", &self.engine.is_some())
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            fail_fast: false,
            engine: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    /// Number of files added to the table.
    pub added: usize,
    /// Row names of files that were skipped.
    pub rejected: Vec<String>,
    /// Whether any added file introduced missing values.
    pub new_missing: bool,
}

/// Enumerate `sources` and add every file they yield to `aggregator`.
///
/// Sources are processed in order. Files within a directory are added in path order, bundle
/// entries in the order they appear in the bundle.
///
/// When an observer is configured, this function reports:
///
/// - `on_file_added` for every added file, with the table's new shape
/// - `on_file_rejected` for every skipped file, with a computed severity
/// - `on_alert` when that severity is >= `options.alert_at_or_above`
///
/// # Errors
///
/// A source that cannot be enumerated (missing path, unreadable manifest, bundle that is not a
/// JSON object, directory traversal failure) aborts the run. A single file that cannot be read,
/// parsed or flattened is skipped, unless `options.fail_fast` is set. Adding to an already
/// analyzed table always aborts.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use rust_data_qc::aggregation::Aggregator;
/// use rust_data_qc::config::HeuristicConfig;
/// use rust_data_qc::ingestion::{ingest_sources, IngestionOptions, IngestionSeverity, Source, StdErrObserver};
///
/// # fn main() -> Result<(), rust_data_qc::IngestionError> {
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver::default())),
///     alert_at_or_above: IngestionSeverity::Error,
///     ..Default::default()
/// };
///
/// let mut table = Aggregator::new(HeuristicConfig::default());
/// let summary = ingest_sources(&[Source::parse("runs/"), Source::parse("@more.txt")], &opts, &mut table)?;
/// println!("added={} skipped={}", summary.added, summary.rejected.len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_sources(
    sources: &[Source],
    options: &IngestionOptions,
    aggregator: &mut Aggregator,
) -> IngestionResult<IngestionSummary> {
    let mut session = Session {
        options,
        aggregator,
        summary: IngestionSummary::default(),
    };

    for source in sources {
        match source {
            Source::Manifest(manifest) => {
                for entry in read_manifest(manifest)? {
                    if entry.is_dir() {
                        session.ingest_directory(&entry)?;
                    } else if entry.is_file() {
                        session.ingest_cache_files(std::slice::from_ref(&entry))?;
                    } else {
                        return Err(IngestionError::InvalidSource { path: entry });
                    }
                }
            }
            Source::Path(path) if path.is_dir() => session.ingest_directory(path)?,
            Source::Path(path) if path.is_file() => session.ingest_bundle(path)?,
            Source::Path(path) => return Err(IngestionError::InvalidSource { path: path.clone() }),
        }
    }

    Ok(session.summary)
}

struct Session<'a> {
    options: &'a IngestionOptions,
    aggregator: &'a mut Aggregator,
    summary: IngestionSummary,
}

impl Session<'_> {
    fn ingest_directory(&mut self, root: &Path) -> IngestionResult<()> {
        let paths = walk_cache_files(root, &self.options.walk)?;
        self.ingest_cache_files(&paths)
    }

    fn ingest_cache_files(&mut self, paths: &[PathBuf]) -> IngestionResult<()> {
        let options = self.options;
        let extensions = &options.walk.extensions;

        if let Some(engine) = &options.engine {
            let loaded = engine.load_parallel(paths, extensions, self.aggregator.config());
            for file in loaded {
                self.admit(&file.filename, &file.source, file.record)?;
            }
            return Ok(());
        }

        for path in paths {
            let (filename, record) = match load_cache_file(path, extensions) {
                Ok((filename, document)) => {
                    let record = self.flatten(&filename, &document);
                    (filename, record)
                }
                Err(e) => (row_name(path), Err(e)),
            };
            self.admit(&filename, path, record)?;
        }
        Ok(())
    }

    fn ingest_bundle(&mut self, path: &Path) -> IngestionResult<()> {
        let entries = load_bundle(path)?;
        let options = self.options;

        if let Some(engine) = &options.engine {
            let flattened = engine.flatten_parallel(&entries, self.aggregator.config());
            for (filename, record) in flattened {
                let record = record.map_err(|source| IngestionError::Rejected {
                    filename: filename.clone(),
                    source,
                });
                self.admit(&filename, path, record)?;
            }
            return Ok(());
        }

        for (filename, document) in &entries {
            let record = self.flatten(filename, document);
            self.admit(filename, path, record)?;
        }
        Ok(())
    }

    fn flatten(&self, filename: &str, document: &Value) -> IngestionResult<FlatRecord> {
        FlatRecord::from_document(document, self.aggregator.config()).map_err(|source| IngestionError::Rejected {
            filename: filename.to_string(),
            source,
        })
    }

    fn admit(&mut self, filename: &str, source: &Path, record: IngestionResult<FlatRecord>) -> IngestionResult<()> {
        let merged = record.and_then(|record| {
            self.aggregator
                .merge(filename, record)
                .map_err(|source| IngestionError::Rejected {
                    filename: filename.to_string(),
                    source,
                })
        });

        let ctx = IngestionContext {
            filename: filename.to_string(),
            source: source.to_path_buf(),
        };

        match merged {
            Ok(new_missing) => {
                self.summary.added += 1;
                self.summary.new_missing |= new_missing;
                if let Some(obs) = self.options.observer.as_ref() {
                    let stats = IngestionStats {
                        row: self.aggregator.row_count() - 1,
                        columns: self.aggregator.columns().len(),
                        new_missing,
                    };
                    obs.on_file_added(&ctx, stats);
                }
                Ok(())
            }
            Err(e @ IngestionError::Rejected {
                source: AggregationError::Frozen { .. },
                ..
            }) => Err(e),
            Err(e) => {
                let sev = IngestionSeverity::for_error(&e);
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_file_rejected(&ctx, sev, &e);
                    if sev >= self.options.alert_at_or_above {
                        obs.on_alert(&ctx, sev, &e);
                    }
                }
                self.summary.rejected.push(ctx.filename);
                if self.options.fail_fast { Err(e) } else { Ok(()) }
            }
        }
    }
}
