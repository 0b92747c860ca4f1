//! CSV export of the flattened table: one row per file, one column per statistic path.

use std::io::Write;

use crate::aggregation::Aggregator;
use crate::error::ReportResult;

/// Write the table as CSV with a leading `file` column.
///
/// Missing cells are empty; matrices are written as their shape descriptor (e.g. `(3,2):float`).
pub fn write_csv<W: Write>(aggregator: &Aggregator, writer: W) -> ReportResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(aggregator.columns().len() + 1);
    header.push("file");
    header.extend(aggregator.columns().keys().map(String::as_str));
    wtr.write_record(&header)?;

    for (row, filename) in aggregator.files().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(filename.clone());
        for column in aggregator.columns().values() {
            record.push(column.get(row).map(ToString::to_string).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_csv;
    use crate::aggregation::Aggregator;
    use crate::config::HeuristicConfig;
    use serde_json::json;

    #[test]
    fn writes_one_row_per_file() {
        let mut table = Aggregator::new(HeuristicConfig::default());
        table.add_file("a", &json!({"p": {"n": 1, "s": "x,y"}})).unwrap();
        table.add_file("b", &json!({"p": {"n": 2.5, "m": [[1, 2]]}})).unwrap();

        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "file,p/m,p/n,p/s");
        assert_eq!(lines[1], "a,,1,\"x,y\"");
        assert_eq!(lines[2], "b,\"(1,2):int\",2.5,");
    }
}
