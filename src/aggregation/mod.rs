//! Aggregation of per-file statistics into a column table, and anomaly classification.
//!
//! The [`Aggregator`] owns one [`Column`] per statistic path and one row per added file. Files are
//! added one at a time; once all are in, [`Aggregator::analyze`] decides the collection's
//! [`Status`] in strict priority order:
//!
//! 1. missing values (some statistic is absent for some file)
//! 2. type conflicts (a statistic has more than one type across files)
//! 3. anomalies (quantitative outliers, or categorical values differing from the majority)
//!
//! ## Example
//!
//! ```rust
//! use rust_data_qc::aggregation::{Aggregator, Status};
//! use rust_data_qc::config::HeuristicConfig;
//! use serde_json::json;
//!
//! let mut table = Aggregator::new(HeuristicConfig::default());
//! for (i, reads) in [100, 101, 99, 100, 100, 9000].into_iter().enumerate() {
//!     let doc = json!({"fastq": {"reads": reads, "encoding": "phred33"}});
//!     table.add_file(format!("sample{i}"), &doc).unwrap();
//! }
//!
//! assert_eq!(table.analyze(), Status::Anomalies);
//! let m = table.incidence_matrix().unwrap();
//! assert_eq!(m.rows, ["sample5"]);
//! assert_eq!(m.cols, ["fastq/reads"]);
//! assert_eq!(m.body, [[true]]);
//! ```

mod column;
mod flatten;
mod shape;
mod stats;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::config::HeuristicConfig;
use crate::error::{AggregationError, AggregationResult};

pub use column::Column;
pub use flatten::{flatten, ColumnSink, FlatRecord};
pub use shape::classify_matrix;
pub use stats::{
    mean_absolute_deviation, median, median_absolute_deviation, OutlierRule, MIN_OUTLIER_SAMPLE,
};

/// Collection-wide anomaly classification, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Every column is complete, uniquely typed and free of outliers.
    NoAnomalies,
    /// At least one statistic is absent for at least one file.
    MissingValues,
    /// At least one statistic has more than one type across files.
    TypeConflict,
    /// At least one statistic has outlying or non-majority values.
    Anomalies,
}

impl Status {
    /// Rows of `column` implicated under this status, or `None` for [`Status::NoAnomalies`].
    pub fn flagged_rows(self, column: &Column, rule: &OutlierRule) -> Option<Vec<usize>> {
        match self {
            Self::NoAnomalies => None,
            Self::MissingValues => Some(column.missing_indices()),
            Self::TypeConflict => Some(column.minor_type_indices()),
            Self::Anomalies => Some(column.outlier_indices(rule)),
        }
    }

    /// Numeric status code carried in reports.
    pub fn code(self) -> u8 {
        match self {
            Self::NoAnomalies => 0,
            Self::MissingValues => 1,
            Self::TypeConflict => 2,
            Self::Anomalies => 3,
        }
    }

    /// Human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            Self::NoAnomalies => "no anomalies detected",
            Self::MissingValues => "missing values present in plugin output",
            Self::TypeConflict => "conflicts in the column types",
            Self::Anomalies => "anomalies detected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of [`Aggregator::analyze`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub status: Status,
    /// Anomalous column names, sorted.
    pub columns: Vec<String>,
    /// Anomalous row indices, sorted ascending.
    pub rows: Vec<usize>,
}

/// Sparse boolean relation between anomalous files and anomalous columns.
///
/// `body[r][c]` is true iff file `rows[r]` is flagged in column `cols[c]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidenceMatrix {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub body: Vec<Vec<bool>>,
}

/// Column table of per-file statistics.
///
/// Rows are files in arrival order; columns are statistic paths in sorted order. Between calls,
/// every column has exactly one cell per file.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: HeuristicConfig,
    files: Vec<String>,
    columns: BTreeMap<String, Column>,
    rejects: BTreeSet<String>,
    analysis: Option<Analysis>,
}

impl Aggregator {
    /// Create an empty table.
    pub fn new(config: HeuristicConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Filenames in row order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn row_count(&self) -> usize {
        self.files.len()
    }

    /// Columns keyed by statistic path.
    pub fn columns(&self) -> &BTreeMap<String, Column> {
        &self.columns
    }

    pub fn column(&self, path: &str) -> Option<&Column> {
        self.columns.get(path)
    }

    /// Paths seen in documents but excluded by the column selection.
    pub fn rejected_columns(&self) -> &BTreeSet<String> {
        &self.rejects
    }

    /// Status of the last [`Self::analyze`] call.
    pub fn status(&self) -> Option<Status> {
        self.analysis.as_ref().map(|a| a.status)
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    /// Flatten `document` and append it as the next row.
    ///
    /// Returns `true` if adding this file introduced missing values anywhere: either an existing
    /// column had no value for it, or it brought a statistic earlier files lacked.
    ///
    /// # Errors
    ///
    /// Malformed documents are rejected whole; the table is unchanged. Adding after
    /// [`Self::analyze`] fails with [`AggregationError::Frozen`].
    pub fn add_file(&mut self, filename: impl Into<String>, document: &Value) -> AggregationResult<bool> {
        let filename = filename.into();
        self.ensure_open(&filename)?;
        let record = FlatRecord::from_document(document, &self.config)?;
        self.merge(filename, record)
    }

    /// Append an already flattened record as the next row.
    ///
    /// This is the sequential half of parallel ingestion: records may be built concurrently,
    /// but must be merged one at a time, in a deterministic order.
    pub fn merge(&mut self, filename: impl Into<String>, record: FlatRecord) -> AggregationResult<bool> {
        let filename = filename.into();
        self.ensure_open(&filename)?;

        let prior_rows = self.files.len();
        let mut backfilled = false;
        let (entries, rejected) = record.into_parts();
        for (path, cell) in entries {
            let column = self.columns.entry(path).or_insert_with(|| {
                backfilled |= prior_rows > 0;
                Column::with_missing(prior_rows)
            });
            column.push(cell);
        }
        self.rejects.extend(rejected);
        self.files.push(filename);

        let rows = self.files.len();
        let mut padded = false;
        for column in self.columns.values_mut() {
            padded |= column.pad_to(rows);
        }
        for (path, column) in &self.columns {
            assert!(
                column.len() == rows,
                "column '{path}' has {} cells but {rows} files were added",
                column.len()
            );
        }
        Ok(padded || backfilled)
    }

    /// Classify the collection and record the anomalous columns and rows.
    ///
    /// Never fails; a collection too small to judge reports [`Status::NoAnomalies`]. After this
    /// call the table no longer accepts files.
    pub fn analyze(&mut self) -> Status {
        let rule = self.config.outliers;
        let tiers: [(Status, &dyn Fn(&Column) -> bool); 3] = [
            (Status::MissingValues, &|c: &Column| c.is_missing_data()),
            (Status::TypeConflict, &|c: &Column| !c.is_uniquely_typed()),
            (Status::Anomalies, &|c: &Column| !c.is_single_valued(&rule)),
        ];

        let mut analysis = Analysis {
            status: Status::NoAnomalies,
            columns: Vec::new(),
            rows: Vec::new(),
        };
        for (status, is_anomalous) in tiers {
            let columns: Vec<String> = self
                .columns
                .iter()
                .filter(|(_, c)| is_anomalous(*c))
                .map(|(name, _)| name.clone())
                .collect();
            if columns.is_empty() {
                continue;
            }
            let rows: BTreeSet<usize> = columns
                .iter()
                .filter_map(|name| status.flagged_rows(&self.columns[name], &rule))
                .flatten()
                .collect();
            analysis = Analysis {
                status,
                columns,
                rows: rows.into_iter().collect(),
            };
            break;
        }

        let status = analysis.status;
        self.analysis = Some(analysis);
        status
    }

    /// Incidence matrix for the last analysis.
    ///
    /// Returns `None` before [`Self::analyze`] and when nothing anomalous was found.
    pub fn incidence_matrix(&self) -> Option<IncidenceMatrix> {
        let analysis = self.analysis.as_ref()?;
        let rule = &self.config.outliers;
        let flagged: Vec<BTreeSet<usize>> = analysis
            .columns
            .iter()
            .map(|name| {
                analysis
                    .status
                    .flagged_rows(&self.columns[name], rule)
                    .map(|rows| rows.into_iter().collect())
            })
            .collect::<Option<_>>()?;
        if analysis.status == Status::NoAnomalies {
            return None;
        }

        let body = analysis
            .rows
            .iter()
            .map(|row| flagged.iter().map(|set| set.contains(row)).collect())
            .collect();
        Some(IncidenceMatrix {
            rows: analysis.rows.iter().map(|&r| self.files[r].clone()).collect(),
            cols: analysis.columns.clone(),
            body,
        })
    }

    fn ensure_open(&self, filename: &str) -> AggregationResult<()> {
        if self.analysis.is_some() {
            return Err(AggregationError::Frozen {
                filename: filename.to_string(),
            });
        }
        Ok(())
    }
}
