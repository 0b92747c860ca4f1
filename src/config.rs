//! Heuristic configuration.
//!
//! A [`HeuristicConfig`] controls which statistics become columns, whether object matrices are
//! decomposed, and the robust outlier rule. Use [`Default`] for common cases, or load a JSON file
//! with [`HeuristicConfig::from_path`]; keys present in the file replace the defaults.
//!
//! ```json
//! {
//!   "outliers": { "threshold": 5.0 },
//!   "descend_object_matrices": false,
//!   "columns": { "include": ["fastq/**"], "exclude": ["*/timestamp"] }
//! }
//! ```

use std::fs;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::aggregation::OutlierRule;
use crate::error::{ConfigError, ConfigResult};

/// Options controlling flattening and anomaly heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Robust outlier rule applied to quantitative columns.
    pub outliers: OutlierRule,
    /// Descend into matrices whose elements are objects, producing one column per element field.
    pub descend_object_matrices: bool,
    /// Path selectors deciding which statistics become columns.
    pub columns: ColumnSelection,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            outliers: OutlierRule::default(),
            descend_object_matrices: true,
            columns: ColumnSelection::default(),
        }
    }
}

impl HeuristicConfig {
    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        let rule = &self.outliers;
        for (field, value) in [
            ("outliers.threshold", rule.threshold),
            ("outliers.mad_scale", rule.mad_scale),
            ("outliers.mean_ad_scale", rule.mean_ad_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be a positive finite number (got {value})"),
                });
            }
        }
        Ok(())
    }
}

/// Glob selectors over statistic paths.
///
/// A path becomes a column when it matches any `include` pattern (or `include` is empty) and
/// matches no `exclude` pattern. `*` does not cross `/`; use `**` for any depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSelection", into = "RawSelection")]
pub struct ColumnSelection {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl ColumnSelection {
    /// Build a selection from glob pattern strings.
    pub fn new<I, E>(include: I, exclude: E) -> ConfigResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Whether the statistic at `path` should become a column.
    pub fn accepts(&self, path: &str) -> bool {
        let opts = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let included = self.include.is_empty()
            || self.include.iter().any(|p| p.matches_with(path, opts));
        included && !self.exclude.iter().any(|p| p.matches_with(path, opts))
    }
}

fn compile<I>(patterns: I) -> ConfigResult<Vec<Pattern>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| {
            let p = p.as_ref();
            Pattern::new(p).map_err(|source| ConfigError::Selector {
                pattern: p.to_string(),
                source,
            })
        })
        .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawSelection {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl TryFrom<RawSelection> for ColumnSelection {
    type Error = ConfigError;

    fn try_from(raw: RawSelection) -> Result<Self, Self::Error> {
        Self::new(raw.include, raw.exclude)
    }
}

impl From<ColumnSelection> for RawSelection {
    fn from(sel: ColumnSelection) -> Self {
        Self {
            include: sel.include.iter().map(|p| p.as_str().to_string()).collect(),
            exclude: sel.exclude.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}
