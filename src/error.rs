use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for aggregation operations.
pub type AggregationResult<T> = Result<T, AggregationError>;

/// Convenience result type for source enumeration and loading.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for loading a heuristic configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience result type for writing reports.
pub type ReportResult<T> = Result<T, ReportError>;

/// Structural errors raised while adding one file's document to the table.
///
/// All of these are fatal to the file being added: the table is left exactly as it was before
/// the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// The document root is not a mapping.
    #[error("document root must be an object (found {found})")]
    NotAnObject { found: &'static str },

    /// The document root is an empty mapping.
    #[error("document root must not be empty")]
    EmptyDocument,

    /// A sequence mixes element shapes or leaf types and is not a matrix.
    #[error(
        "malformed sequence at '{path}': arrays must constitute matrices \
         (N complete dimensions with uniform component type)"
    )]
    MalformedSequence { path: String },

    /// An empty nested mapping was encountered.
    #[error("malformed mapping at '{path}': objects must not be empty")]
    MalformedMapping { path: String },

    /// Two locations in one document flatten to the same path string.
    #[error("duplicate statistic path '{path}' within one document")]
    DuplicatePath { path: String },

    /// Files cannot be added once the table has been analyzed.
    #[error("cannot add '{filename}': the table has already been analyzed")]
    Frozen { filename: String },
}

/// Error type returned while enumerating and loading sources.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Directory recursion failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// An include/exclude pattern is not a valid regular expression.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A source is neither a file, a directory nor a manifest.
    #[error("{path} is neither file nor directory")]
    InvalidSource { path: PathBuf },

    /// A cache file does not carry one of the expected extensions.
    #[error("expected one of {expected:?} cache file, received {path}")]
    UnexpectedExtension { path: PathBuf, expected: Vec<String> },

    /// A pre-aggregated bundle is not a JSON object of filename -> document.
    #[error("bundle {path} must be a json object mapping filenames to documents")]
    InvalidBundle { path: PathBuf },

    /// A file's document was rejected by the aggregator.
    #[error("{filename}: {source}")]
    Rejected {
        filename: String,
        #[source]
        source: AggregationError,
    },
}

/// Error type returned when a heuristic configuration cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("io error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::config::HeuristicConfig`].
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A column selector is not a valid glob pattern.
    #[error("invalid column selector '{pattern}': {source}")]
    Selector {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A numeric parameter is out of range.
    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Error type returned while writing a report or table.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Underlying I/O error while writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
