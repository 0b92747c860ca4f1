//! Rendering an analyzed table for people and for other tools.
//!
//! - [`Report`]: serializable summary of an analysis (JSON via [`Report::to_json`])
//! - [`html`]: a self-contained HTML page with the incidence matrix
//! - [`table`]: the full flattened table as CSV

pub mod html;
pub mod table;

use std::io::Write;

use serde::Serialize;

use crate::aggregation::{Aggregator, IncidenceMatrix, Status};
use crate::error::ReportResult;

/// Summary of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status: Status,
    /// Numeric status: 0 no anomalies, 1 missing values, 2 type conflict, 3 anomalies.
    pub code: u8,
    pub message: String,
    pub files: usize,
    pub columns: usize,
    /// Paths dropped by the column selection.
    pub rejected_columns: Vec<String>,
    /// Columns responsible for the status.
    pub anomalous_columns: Vec<String>,
    pub incidence: Option<IncidenceMatrix>,
}

impl Report {
    /// Build a report from an analyzed table.
    ///
    /// Returns `None` if [`Aggregator::analyze`] has not been called.
    pub fn from_aggregator(aggregator: &Aggregator) -> Option<Self> {
        let analysis = aggregator.analysis()?;
        Some(Self {
            status: analysis.status,
            code: analysis.status.code(),
            message: analysis.status.message().to_string(),
            files: aggregator.row_count(),
            columns: aggregator.columns().len(),
            rejected_columns: aggregator.rejected_columns().iter().cloned().collect(),
            anomalous_columns: analysis.columns.clone(),
            incidence: aggregator.incidence_matrix(),
        })
    }

    /// Whether anything was flagged.
    pub fn has_anomalies(&self) -> bool {
        self.status != Status::NoAnomalies
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty-printed JSON followed by a newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> ReportResult<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
