//! `rust-data-qc` aggregates per-file plugin statistics into a column table and flags files
//! whose statistics look anomalous compared with the rest of the collection.
//!
//! Each data file is summarized by a JSON document of plugin outputs (the *cache*). The
//! [`aggregation::Aggregator`] flattens every document into `plugin/statistic/...` paths, keeps
//! one typed [`aggregation::Column`] per path and one row per file, then classifies the whole
//! collection:
//!
//! - [`aggregation::Status::MissingValues`]: a statistic is absent for some file
//! - [`aggregation::Status::TypeConflict`]: a statistic has more than one type across files
//! - [`aggregation::Status::Anomalies`]: a numeric statistic has robust outliers, or a categorical
//!   one disagrees with the majority
//!
//! The first applicable status wins. An [`aggregation::IncidenceMatrix`] then relates the
//! implicated files to the implicated statistics.
//!
//! ## Quick example
//!
//! ```rust
//! use rust_data_qc::aggregation::{Aggregator, Status};
//! use rust_data_qc::config::HeuristicConfig;
//! use serde_json::json;
//!
//! let mut table = Aggregator::new(HeuristicConfig::default());
//! table.add_file("a.fastq", &json!({"fastq": {"reads": 100, "encoding": "phred33"}})).unwrap();
//! table.add_file("b.fastq", &json!({"fastq": {"reads": 120}})).unwrap();
//!
//! assert_eq!(table.analyze(), Status::MissingValues);
//! let m = table.incidence_matrix().unwrap();
//! assert_eq!(m.rows, ["b.fastq"]);
//! assert_eq!(m.cols, ["fastq/encoding"]);
//! ```
//!
//! ## Loading caches from disk
//!
//! [`ingestion::ingest_sources`] walks directories, reads bundles and `@manifest` lists, and
//! reports every added or skipped file to an optional [`ingestion::IngestionObserver`]. Pass an
//! [`execution::ExecutionEngine`] in [`ingestion::IngestionOptions`] to parse and flatten files on
//! a thread pool; merging stays sequential and ordered.
//!
//! ```no_run
//! use rust_data_qc::aggregation::Aggregator;
//! use rust_data_qc::config::HeuristicConfig;
//! use rust_data_qc::ingestion::{ingest_sources, IngestionOptions, Source};
//! use rust_data_qc::report::Report;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut table = Aggregator::new(HeuristicConfig::from_path("qc.json")?);
//! ingest_sources(&[Source::parse("runs/")], &IngestionOptions::default(), &mut table)?;
//! table.analyze();
//! if let Some(report) = Report::from_aggregator(&table) {
//!     println!("{}", report.to_json()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod report;
pub mod types;

pub use error::{
    AggregationError, AggregationResult, ConfigError, ConfigResult, IngestionError, IngestionResult, ReportError,
    ReportResult,
};
