//! Self-contained HTML page for a [`Report`], with inline CSS and no external resources.

use std::io::Write;

use crate::aggregation::{IncidenceMatrix, Status};
use crate::error::ReportResult;

use super::Report;

/// Page title used by [`render`].
pub const DEFAULT_TITLE: &str = "Plugin statistics quality report";

/// Write `report` as an HTML page.
pub fn render<W: Write>(report: &Report, writer: W) -> ReportResult<()> {
    render_with_title(report, DEFAULT_TITLE, writer)
}

/// Write `report` as an HTML page with a custom title.
pub fn render_with_title<W: Write>(report: &Report, title: &str, mut writer: W) -> ReportResult<()> {
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str("<style>\n");
    html.push_str(INLINE_CSS);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));

    html.push_str(&format!(
        "<div class=\"summary {}\">\n<span class=\"status\">{}</span>\n",
        status_class(report.status),
        escape_html(&report.message)
    ));
    html.push_str(&format!(
        "<span class=\"detail\">{} files &middot; {} statistics</span>\n</div>\n",
        report.files, report.columns
    ));

    if let Some(matrix) = &report.incidence {
        push_matrix(&mut html, report.status, matrix);
    }

    if !report.rejected_columns.is_empty() {
        html.push_str("<h2>Ignored statistics</h2>\n<ul class=\"ignored\">\n");
        for name in &report.rejected_columns {
            html.push_str(&format!("<li>{}</li>\n", escape_html(name)));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    writer.write_all(html.as_bytes())?;
    Ok(())
}

fn push_matrix(html: &mut String, status: Status, matrix: &IncidenceMatrix) {
    html.push_str("<table class=\"incidence\">\n<thead>\n<tr><th>file</th>");
    for col in &matrix.cols {
        html.push_str(&format!("<th>{}</th>", escape_html(col)));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    let mark = match status {
        Status::MissingValues => "missing",
        Status::TypeConflict => "type",
        _ => "outlier",
    };
    for (row, flags) in matrix.rows.iter().zip(&matrix.body) {
        html.push_str(&format!("<tr><th>{}</th>", escape_html(row)));
        for &flagged in flags {
            if flagged {
                html.push_str(&format!("<td class=\"hit\">{mark}</td>"));
            } else {
                html.push_str("<td></td>");
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
}

fn status_class(status: Status) -> &'static str {
    match status {
        Status::NoAnomalies => "status-ok",
        Status::MissingValues => "status-missing",
        Status::TypeConflict => "status-conflict",
        Status::Anomalies => "status-anomalies",
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const INLINE_CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2rem; color: #1e293b; }
.summary { padding: 0.75rem 1rem; border-radius: 6px; margin-bottom: 1.5rem; }
.summary .status { font-weight: 600; margin-right: 1rem; }
.status-ok { background: #dcfce7; }
.status-missing { background: #fef9c3; }
.status-conflict { background: #ffedd5; }
.status-anomalies { background: #fee2e2; }
table.incidence { border-collapse: collapse; font-size: 0.85rem; }
table.incidence th, table.incidence td { border: 1px solid #e2e8f0; padding: 0.25rem 0.5rem; }
table.incidence thead th { writing-mode: vertical-rl; transform: rotate(180deg); text-align: left; }
table.incidence tbody th { text-align: left; font-weight: normal; }
td.hit { background: #f87171; color: white; text-align: center; }
"#;
