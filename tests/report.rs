use std::fs::{self, File};

use rust_data_qc::aggregation::{Aggregator, Status};
use rust_data_qc::config::HeuristicConfig;
use rust_data_qc::report::{html, table, Report};
use serde_json::{json, Value};

fn analyzed() -> Aggregator {
    let mut t = Aggregator::new(HeuristicConfig::default());
    for (i, reads) in [100, 101, 99, 100, 5000].into_iter().enumerate() {
        t.add_file(format!("s{i}.fastq"), &json!({"fastq": {"reads": reads, "tags": ["a", "b"]}}))
            .unwrap();
    }
    t.analyze();
    t
}

#[test]
fn report_round_trips_through_json() {
    let report = Report::from_aggregator(&analyzed()).unwrap();
    assert_eq!(report.status, Status::Anomalies);
    assert!(report.has_anomalies());

    let mut out = Vec::new();
    report.write_json(&mut out).unwrap();
    let value: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["code"], 3);
    assert_eq!(value["files"], 5);
    assert_eq!(value["anomalous_columns"], json!(["fastq/reads"]));
    assert_eq!(value["incidence"]["rows"], json!(["s4.fastq"]));
}

#[test]
fn html_and_csv_are_written_to_files() {
    let t = analyzed();
    let report = Report::from_aggregator(&t).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let page = dir.path().join("report.html");
    html::render(&report, File::create(&page).unwrap()).unwrap();
    let text = fs::read_to_string(&page).unwrap();
    assert!(text.starts_with("<!DOCTYPE html>"));
    assert!(text.contains("<tr><th>s4.fastq</th><td class=\"hit\">outlier</td></tr>"));

    let csv_path = dir.path().join("table.csv");
    table::write_csv(&t, File::create(&csv_path).unwrap()).unwrap();
    let csv_text = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "file,fastq/reads,fastq/tags");
    assert_eq!(lines[5], "s4.fastq,5000,\"{a,b}\"");
}
