//! Depth-first flattening of a document into `(path, value)` pairs.
//!
//! Mappings are transparent: only scalars and sequences reach the sink. Each emitted location is
//! named by the `/`-joined mapping keys and sequence indices leading to it, e.g.
//! `fastq/quality/histogram` or `plugin/records/3/length`.

use std::collections::HashSet;
use std::iter::Enumerate;
use std::slice;

use serde_json::{map, Value};

use crate::config::HeuristicConfig;
use crate::error::{AggregationError, AggregationResult};
use crate::types::{Cell, ElementType, MatrixDescriptor};

use super::shape::classify_matrix;

/// Receiver of the values found while flattening a document.
pub trait ColumnSink {
    /// Called once per scalar (`matrix` is `None`) and once per sequence (`matrix` carries its
    /// descriptor; zero-length sequences get [`MatrixDescriptor::indeterminate`]).
    ///
    /// Returning `true` for a non-empty sequence asks the traversal to descend into its elements.
    /// The return value is ignored for scalars.
    fn accept(&mut self, path: &str, value: &Value, matrix: Option<&MatrixDescriptor>) -> bool;
}

enum Cursor<'a> {
    Object(map::Iter<'a>),
    Array(Enumerate<slice::Iter<'a, Value>>),
}

impl<'a> Iterator for Cursor<'a> {
    type Item = (String, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Object(it) => it.next().map(|(k, v)| (k.clone(), v)),
            Self::Array(it) => it.next().map(|(i, v)| (i.to_string(), v)),
        }
    }
}

/// Walk `document` depth-first, reporting every scalar and sequence to `sink`.
///
/// The root must be a non-empty mapping. Keys are visited in document order. The walk keeps its
/// own stack, so arbitrarily deep documents are safe.
///
/// # Errors
///
/// Fails on the first empty nested mapping ([`AggregationError::MalformedMapping`]) or sequence
/// that is not a matrix ([`AggregationError::MalformedSequence`]). Values already delivered to the
/// sink are not retracted; callers that need all-or-nothing semantics should stage them, as
/// [`FlatRecord::from_document`] does.
pub fn flatten<S>(document: &Value, sink: &mut S) -> AggregationResult<()>
where
    S: ColumnSink + ?Sized,
{
    let root = match document {
        Value::Object(root) => root,
        other => {
            return Err(AggregationError::NotAnObject {
                found: kind_name(other),
            });
        }
    };
    if root.is_empty() {
        return Err(AggregationError::EmptyDocument);
    }

    // `path` always holds one segment fewer than `stack` has frames.
    let mut path: Vec<String> = Vec::new();
    let mut stack: Vec<Cursor<'_>> = vec![Cursor::Object(root.iter())];

    while let Some(cursor) = stack.last_mut() {
        let Some((segment, child)) = cursor.next() else {
            stack.pop();
            path.pop();
            continue;
        };

        match child {
            Value::Object(fields) => {
                if fields.is_empty() {
                    return Err(AggregationError::MalformedMapping {
                        path: join(&path, &segment),
                    });
                }
                path.push(segment);
                stack.push(Cursor::Object(fields.iter()));
            }
            Value::Array(items) => {
                let name = join(&path, &segment);
                let descriptor = if items.is_empty() {
                    MatrixDescriptor::indeterminate()
                } else {
                    match classify_matrix(items) {
                        Some(d) => d,
                        None => return Err(AggregationError::MalformedSequence { path: name }),
                    }
                };
                if sink.accept(&name, child, Some(&descriptor)) && !items.is_empty() {
                    path.push(segment);
                    stack.push(Cursor::Array(items.iter().enumerate()));
                }
            }
            scalar => {
                sink.accept(&join(&path, &segment), scalar, None);
            }
        }
    }
    Ok(())
}

fn join(prefix: &[String], last: &str) -> String {
    let mut out = String::with_capacity(prefix.iter().map(|s| s.len() + 1).sum::<usize>() + last.len());
    for segment in prefix {
        out.push_str(segment);
        out.push('/');
    }
    out.push_str(last);
    out
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One document flattened into cells, ready to be merged into a table.
///
/// Building a record never touches the table, which gives file ingestion its all-or-nothing
/// behavior and lets independent documents be flattened in parallel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    entries: Vec<(String, Cell)>,
    rejected: Vec<String>,
}

impl FlatRecord {
    /// Flatten `document` using the column selection and matrix policy in `config`.
    ///
    /// One-dimensional string vectors with all-distinct elements become set cells. Object
    /// matrices are decomposed (one column per element field) when
    /// [`HeuristicConfig::descend_object_matrices`] is set; scalar matrices never are.
    ///
    /// ```
    /// use rust_data_qc::aggregation::FlatRecord;
    /// use rust_data_qc::config::HeuristicConfig;
    ///
    /// let doc = serde_json::json!({"fastq": {"reads": 1200, "tags": ["a", "b"]}});
    /// let record = FlatRecord::from_document(&doc, &HeuristicConfig::default()).unwrap();
    /// let paths: Vec<&str> = record.entries().iter().map(|(p, _)| p.as_str()).collect();
    /// assert_eq!(paths, ["fastq/reads", "fastq/tags"]);
    /// ```
    pub fn from_document(document: &Value, config: &HeuristicConfig) -> AggregationResult<Self> {
        let mut builder = RecordBuilder {
            config,
            record: FlatRecord::default(),
            seen: HashSet::new(),
            duplicate: None,
        };
        flatten(document, &mut builder)?;
        if let Some(path) = builder.duplicate {
            return Err(AggregationError::DuplicatePath { path });
        }
        Ok(builder.record)
    }

    /// Accepted `(path, cell)` pairs in traversal order.
    pub fn entries(&self) -> &[(String, Cell)] {
        &self.entries
    }

    /// Paths excluded by the column selection.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<(String, Cell)>, Vec<String>) {
        (self.entries, self.rejected)
    }
}

struct RecordBuilder<'c> {
    config: &'c HeuristicConfig,
    record: FlatRecord,
    seen: HashSet<String>,
    duplicate: Option<String>,
}

impl ColumnSink for RecordBuilder<'_> {
    fn accept(&mut self, path: &str, value: &Value, matrix: Option<&MatrixDescriptor>) -> bool {
        let cell = match matrix {
            None => Cell::from_scalar(value).unwrap_or(Cell::Missing),
            Some(d) => Cell::from_matrix(value, d),
        };
        // A set is a value in its own right; its elements are never visited.
        let descend = match (&cell, matrix) {
            (Cell::Matrix(d), Some(_)) => {
                self.config.descend_object_matrices && d.element == ElementType::Object
            }
            _ => false,
        };

        if !self.seen.insert(path.to_string()) {
            if self.duplicate.is_none() {
                self.duplicate = Some(path.to_string());
            }
            return descend;
        }
        if self.config.columns.accepts(path) {
            self.record.entries.push((path.to_string(), cell));
        } else {
            self.record.rejected.push(path.to_string());
        }
        descend
    }
}

#[cfg(test)]
mod tests {
    use super::{flatten, ColumnSink, FlatRecord};
    use crate::config::{ColumnSelection, HeuristicConfig};
    use crate::error::AggregationError;
    use crate::types::{Cell, ElementType, MatrixDescriptor, ScalarType};
    use serde_json::{json, Value};

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(String, Option<MatrixDescriptor>)>,
        descend: bool,
    }

    impl ColumnSink for Recorder {
        fn accept(&mut self, path: &str, _value: &Value, matrix: Option<&MatrixDescriptor>) -> bool {
            self.seen.push((path.to_string(), matrix.cloned()));
            self.descend
        }
    }

    fn paths(r: &Recorder) -> Vec<&str> {
        r.seen.iter().map(|(p, _)| p.as_str()).collect()
    }

    #[test]
    fn nested_mappings_build_slash_paths_in_document_order() {
        let doc = json!({"b": {"y": 1, "x": {"deep": "v"}}, "a": true});
        let mut r = Recorder::default();
        flatten(&doc, &mut r).unwrap();
        assert_eq!(paths(&r), ["b/y", "b/x/deep", "a"]);
        assert!(r.seen.iter().all(|(_, m)| m.is_none()));
    }

    #[test]
    fn sequences_carry_descriptors() {
        let doc = json!({"p": {"m": [[1, 2], [3, 4]], "e": []}});
        let mut r = Recorder::default();
        flatten(&doc, &mut r).unwrap();
        assert_eq!(
            r.seen,
            vec![
                (
                    "p/m".to_string(),
                    Some(MatrixDescriptor::new(vec![2, 2], ElementType::Scalar(ScalarType::Int)))
                ),
                ("p/e".to_string(), Some(MatrixDescriptor::indeterminate())),
            ]
        );
    }

    #[test]
    fn descending_visits_elements_by_index() {
        let doc = json!({"p": {"recs": [{"n": 1}, {"n": 2}]}});
        let mut r = Recorder {
            descend: true,
            ..Recorder::default()
        };
        flatten(&doc, &mut r).unwrap();
        assert_eq!(paths(&r), ["p/recs", "p/recs/0/n", "p/recs/1/n"]);
    }

    #[test]
    fn empty_nested_mapping_is_rejected() {
        let doc = json!({"p": {"x": 1, "bad": {}}});
        let err = flatten(&doc, &mut Recorder::default()).unwrap_err();
        assert_eq!(
            err,
            AggregationError::MalformedMapping {
                path: "p/bad".to_string()
            }
        );
    }

    #[test]
    fn malformed_sequence_is_rejected() {
        let doc = json!({"p": {"jag": [[1, 2], [3]]}});
        let err = flatten(&doc, &mut Recorder::default()).unwrap_err();
        assert_eq!(
            err,
            AggregationError::MalformedSequence {
                path: "p/jag".to_string()
            }
        );
    }

    #[test]
    fn root_must_be_a_non_empty_object() {
        assert_eq!(
            flatten(&json!({}), &mut Recorder::default()).unwrap_err(),
            AggregationError::EmptyDocument
        );
        assert_eq!(
            flatten(&json!([1]), &mut Recorder::default()).unwrap_err(),
            AggregationError::NotAnObject { found: "array" }
        );
    }

    #[test]
    fn deep_documents_do_not_recurse() {
        let mut doc = json!({"leaf": 1});
        for _ in 0..2_000 {
            doc = json!({ "n": doc });
        }
        let mut r = Recorder::default();
        flatten(&doc, &mut r).unwrap();
        assert_eq!(r.seen.len(), 1);
        assert!(r.seen[0].0.ends_with("n/leaf"));
        assert_eq!(r.seen[0].0.matches('/').count(), 2_000);
        let mut cur = doc;
        while let Value::Object(mut fields) = cur {
            cur = fields.remove("n").unwrap_or(Value::Null);
        }
    }

    #[test]
    fn record_turns_distinct_strings_into_sets() {
        let doc = json!({"p": {"tags": ["x", "y"], "dups": ["x", "x"], "n": null}});
        let rec = FlatRecord::from_document(&doc, &HeuristicConfig::default()).unwrap();
        let cells: Vec<&Cell> = rec.entries().iter().map(|(_, c)| c).collect();
        assert!(matches!(cells[0], Cell::Set(s) if s.len() == 2));
        assert!(matches!(cells[1], Cell::Matrix(d) if d.shape == vec![2]));
        assert_eq!(cells[2], &Cell::Missing);
    }

    #[test]
    fn record_decomposes_object_matrices_only_when_configured() {
        let doc = json!({"p": {"recs": [{"n": 1}, {"n": 2}], "v": [1, 2]}});
        let rec = FlatRecord::from_document(&doc, &HeuristicConfig::default()).unwrap();
        let got: Vec<&str> = rec.entries().iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(got, ["p/recs", "p/recs/0/n", "p/recs/1/n", "p/v"]);

        let flat = HeuristicConfig {
            descend_object_matrices: false,
            ..HeuristicConfig::default()
        };
        let rec = FlatRecord::from_document(&doc, &flat).unwrap();
        let got: Vec<&str> = rec.entries().iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(got, ["p/recs", "p/v"]);
    }

    #[test]
    fn record_applies_column_selection() {
        let cfg = HeuristicConfig {
            columns: ColumnSelection::new(Vec::<String>::new(), ["p/skip"]).unwrap(),
            ..HeuristicConfig::default()
        };
        let rec = FlatRecord::from_document(&json!({"p": {"keep": 1, "skip": 2}}), &cfg).unwrap();
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.rejected(), ["p/skip"]);
    }

    #[test]
    fn colliding_paths_are_rejected() {
        let doc = json!({"a/b": 1, "a": {"b": 2}});
        let err = FlatRecord::from_document(&doc, &HeuristicConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AggregationError::DuplicatePath {
                path: "a/b".to_string()
            }
        );
    }
}
