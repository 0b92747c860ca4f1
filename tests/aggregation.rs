use rust_data_qc::aggregation::{classify_matrix, Aggregator, FlatRecord, Status};
use rust_data_qc::config::{ColumnSelection, HeuristicConfig};
use rust_data_qc::types::{Cell, CellType, ElementType, MatrixDescriptor, ScalarType};
use rust_data_qc::AggregationError;
use serde_json::{json, Value};

fn table() -> Aggregator {
    Aggregator::new(HeuristicConfig::default())
}

fn assert_rectangular(t: &Aggregator) {
    for (path, column) in t.columns() {
        assert_eq!(column.len(), t.row_count(), "column {path}");
    }
}

fn cell(t: &Aggregator, path: &str, row: usize) -> Cell {
    t.column(path).unwrap().get(row).unwrap().clone()
}

#[test]
fn columns_stay_rectangular_across_varied_documents() {
    let docs = [
        json!({"a": {"x": 1}}),
        json!({"a": {"y": "s"}, "b": {"m": [[1.0, 2.0]]}}),
        json!({"a": {"x": 2, "z": null}}),
        json!({"c": {"objs": [{"k": 1}, {"k": 2}]}}),
        json!({"a": {"x": 3, "y": "t", "z": true}}),
    ];
    let mut t = table();
    for (i, d) in docs.iter().enumerate() {
        t.add_file(format!("F{i}"), d).unwrap();
        assert_rectangular(&t);
        assert_eq!(t.row_count(), i + 1);
    }
    assert!(t.column("c/objs/0/k").is_some());
    assert_eq!(cell(&t, "a/z", 2), Cell::Missing);
}

#[test]
fn shape_classification_is_deterministic() {
    let value = json!([[[1.5, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0]], [[1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0]], [[1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0]]]);
    let items = value.as_array().unwrap();
    let first = classify_matrix(items);
    assert_eq!(first, classify_matrix(items));
    assert_eq!(
        first,
        Some(MatrixDescriptor::new(vec![3, 2, 4], ElementType::Scalar(ScalarType::Float)))
    );
}

#[test]
fn jagged_sequence_is_not_a_matrix() {
    let value = json!([[1, 2], [3]]);
    assert_eq!(classify_matrix(value.as_array().unwrap()), None);

    let err = table()
        .add_file("F", &json!({"p": {"jag": [[1, 2], [3]]}}))
        .unwrap_err();
    assert_eq!(err, AggregationError::MalformedSequence { path: "p/jag".to_string() });
}

#[test]
fn distinct_string_vectors_become_sets() {
    let mut t = table();
    t.add_file("F", &json!({"p": {"s": ["a", "b", "c"], "r": ["a", "a", "b"]}})).unwrap();
    assert_eq!(cell(&t, "p/s", 0).cell_type(), CellType::Set);
    assert_eq!(
        cell(&t, "p/r", 0),
        Cell::Matrix(MatrixDescriptor::new(vec![3], ElementType::Scalar(ScalarType::Str)))
    );
}

#[test]
fn missing_data_is_detected_per_column() {
    let mut t = table();
    t.add_file("F1", &json!({"p": {"x": 1}})).unwrap();
    t.add_file("F2", &json!({"p": {"y": 1}})).unwrap();
    assert_eq!(t.column("p/x").unwrap().missing_indices(), [1]);
    assert_eq!(t.column("p/y").unwrap().missing_indices(), [0]);
    assert_eq!(t.analyze(), Status::MissingValues);
    assert_eq!(t.analysis().unwrap().columns, ["p/x", "p/y"]);
}

#[test]
fn minority_type_is_flagged() {
    let mut t = table();
    t.add_file("F1", &json!({"p": {"x": 1}})).unwrap();
    t.add_file("F2", &json!({"p": {"x": "s"}})).unwrap();
    assert_eq!(t.analyze(), Status::TypeConflict);
    let m = t.incidence_matrix().unwrap();
    // With a tie the lower type (int) dominates.
    assert_eq!(m.rows, ["F2"]);
}

#[test]
fn ints_and_floats_are_one_numeric_type() {
    let mut t = table();
    for (i, v) in [json!(1), json!(1.5), json!(2)].into_iter().enumerate() {
        t.add_file(format!("F{i}"), &json!({"p": {"x": v}})).unwrap();
    }
    assert_eq!(t.analyze(), Status::NoAnomalies);
}

#[test]
fn outliers_and_constant_columns() {
    let mut t = table();
    for (i, v) in [10, 11, 9, 10, 10, 1000].into_iter().enumerate() {
        t.add_file(format!("F{i}"), &json!({"p": {"v": v}})).unwrap();
    }
    assert_eq!(t.analyze(), Status::Anomalies);
    let m = t.incidence_matrix().unwrap();
    assert_eq!(m.rows, ["F5"]);

    let mut t = table();
    for i in 0..4 {
        t.add_file(format!("F{i}"), &json!({"p": {"v": 5}})).unwrap();
    }
    assert_eq!(t.analyze(), Status::NoAnomalies);
    assert!(t.incidence_matrix().is_none());
}

#[test]
fn categorical_values_disagreeing_with_majority_are_anomalies() {
    let mut t = table();
    for (i, enc) in ["phred33", "phred33", "phred64", "phred33"].into_iter().enumerate() {
        t.add_file(format!("F{i}"), &json!({"fastq": {"encoding": enc}})).unwrap();
    }
    assert_eq!(t.analyze(), Status::Anomalies);
    assert_eq!(t.analysis().unwrap().rows, [2]);
}

#[test]
fn incidence_body_matches_flagged_cells() {
    let mut t = table();
    let docs: [Value; 4] = [
        json!({"p": {"a": 1, "b": 1, "c": 1}}),
        json!({"p": {"b": 1, "c": 1}}),
        json!({"p": {"a": 1, "c": 1}}),
        json!({"p": {"a": 1, "b": 1, "c": 1}}),
    ];
    let new_missing: Vec<bool> = docs
        .iter()
        .enumerate()
        .map(|(i, d)| t.add_file(format!("F{i}"), d).unwrap())
        .collect();
    // F1 and F2 only lack existing statistics: padded, no new column.
    assert_eq!(new_missing, [false, true, true, false]);
    assert_eq!(t.columns().len(), 3);
    assert_eq!(t.analyze(), Status::MissingValues);
    let m = t.incidence_matrix().unwrap();
    assert_eq!(m.cols, ["p/a", "p/b"]);
    assert_eq!(m.rows, ["F1", "F2"]);
    assert_eq!(m.body.len(), m.rows.len());
    for row in &m.body {
        assert_eq!(row.len(), m.cols.len());
    }
    assert_eq!(m.body, [[true, false], [false, true]]);
}

#[test]
fn column_selection_drops_paths() {
    let config = HeuristicConfig {
        columns: ColumnSelection::new(["p/*"], ["p/time*"]).unwrap(),
        ..HeuristicConfig::default()
    };
    let mut t = Aggregator::new(config);
    t.add_file("F1", &json!({"p": {"x": 1, "timestamp": 5}, "q": {"y": 1}})).unwrap();
    t.add_file("F2", &json!({"p": {"x": 1, "timestamp": 9}})).unwrap();
    assert_eq!(t.columns().keys().collect::<Vec<_>>(), ["p/x"]);
    assert!(t.rejected_columns().contains("p/timestamp"));
    assert!(t.rejected_columns().contains("q/y"));
    assert_eq!(t.analyze(), Status::NoAnomalies);
}

#[test]
fn flat_record_can_be_merged_later() {
    let config = HeuristicConfig::default();
    let record = FlatRecord::from_document(&json!({"p": {"x": 1, "y": [1, 2]}}), &config).unwrap();
    assert_eq!(record.len(), 2);

    let mut t = Aggregator::new(config);
    assert!(!t.merge("F1", record).unwrap());
    assert_eq!(t.row_count(), 1);
}

#[test]
fn frozen_after_analysis() {
    let mut t = table();
    t.add_file("F1", &json!({"p": {"x": 1}})).unwrap();
    t.analyze();
    let err = t.add_file("F2", &json!({"p": {"x": 1}})).unwrap_err();
    assert_eq!(err, AggregationError::Frozen { filename: "F2".to_string() });
    assert_eq!(t.row_count(), 1);
}
