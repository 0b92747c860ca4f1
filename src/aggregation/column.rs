//! Per-statistic column storage and the anomaly detectors evaluated on it.

use std::collections::BTreeMap;

use crate::types::{Cell, CellType};

use super::stats::{OutlierRule, MIN_OUTLIER_SAMPLE};

/// Append-only, file-indexed sequence of cells for one statistic.
///
/// Row `i` always holds the value observed in the `i`-th file added to the table. Besides the
/// cells, a column keeps a histogram of cell types so type questions are answered without
/// rescanning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    cells: Vec<Cell>,
    histogram: BTreeMap<CellType, usize>,
    missing: usize,
}

impl Column {
    /// Create an empty column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a column backfilled with `rows` missing cells.
    pub fn with_missing(rows: usize) -> Self {
        let mut column = Self::new();
        column.pad_to(rows);
        column
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize) -> Option<&Cell> {
        self.cells.get(row)
    }

    /// Append one cell.
    pub fn push(&mut self, cell: Cell) {
        if cell.is_missing() {
            self.missing += 1;
        }
        *self.histogram.entry(cell.cell_type()).or_insert(0) += 1;
        self.cells.push(cell);
    }

    /// Append missing cells until the column holds `rows` cells.
    ///
    /// Returns whether any padding occurred. Never shrinks the column.
    pub fn pad_to(&mut self, rows: usize) -> bool {
        let padded = self.cells.len() < rows;
        while self.cells.len() < rows {
            self.push(Cell::Missing);
        }
        padded
    }

    pub fn is_missing_data(&self) -> bool {
        self.missing > 0
    }

    pub fn missing_count(&self) -> usize {
        self.missing
    }

    pub fn missing_indices(&self) -> Vec<usize> {
        self.rows_where(|cell| cell.is_missing())
    }

    /// Majority type of the non-missing cells.
    ///
    /// Integers count as floats when the column holds any float. Ties go to the lower
    /// [`CellType`]. Returns `None` if every cell is missing.
    pub fn dominant_type(&self) -> Option<CellType> {
        let promote = self.promotes_ints();
        let mut counts: BTreeMap<CellType, usize> = BTreeMap::new();
        for (&t, &n) in &self.histogram {
            if t != CellType::Missing {
                *counts.entry(effective_type(t, promote)).or_insert(0) += n;
            }
        }
        let mut best: Option<(CellType, usize)> = None;
        for (t, n) in counts {
            if best.is_none_or(|(_, m)| n > m) {
                best = Some((t, n));
            }
        }
        best.map(|(t, _)| t)
    }

    /// Whether every non-missing cell shares one type.
    pub fn is_uniquely_typed(&self) -> bool {
        let promote = self.promotes_ints();
        let mut seen: Option<CellType> = None;
        for &t in self.histogram.keys() {
            if t == CellType::Missing {
                continue;
            }
            let t = effective_type(t, promote);
            match seen {
                None => seen = Some(t),
                Some(s) if s != t => return false,
                Some(_) => {}
            }
        }
        true
    }

    /// Non-missing rows whose type differs from the dominant type.
    pub fn minor_type_indices(&self) -> Vec<usize> {
        let Some(dominant) = self.dominant_type() else {
            return Vec::new();
        };
        let promote = self.promotes_ints();
        self.rows_where(|cell| {
            !cell.is_missing() && effective_type(cell.cell_type(), promote) != dominant
        })
    }

    /// Whether the column's dominant type is compared by distribution.
    pub fn is_quantitative(&self) -> bool {
        self.dominant_type().is_some_and(CellType::is_quantitative)
    }

    /// Whether the column has no outliers under `rule`.
    ///
    /// For non-quantitative columns this means every non-missing, dominant-typed cell holds the
    /// same value.
    pub fn is_single_valued(&self, rule: &OutlierRule) -> bool {
        self.outlier_indices(rule).is_empty()
    }

    /// Rows whose value is anomalous relative to the rest of the column.
    ///
    /// Quantitative columns use the robust `rule`. Other columns flag every row whose value
    /// differs from the most frequent value (ties go to the value seen first). Missing and
    /// minor-typed rows are never flagged here.
    pub fn outlier_indices(&self, rule: &OutlierRule) -> Vec<usize> {
        let Some(dominant) = self.dominant_type() else {
            return Vec::new();
        };
        let promote = self.promotes_ints();
        let candidates: Vec<(usize, &Cell)> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_missing() && effective_type(c.cell_type(), promote) == dominant)
            .collect();
        if candidates.len() < 2 {
            return Vec::new();
        }

        if dominant.is_quantitative() {
            if candidates.len() < MIN_OUTLIER_SAMPLE {
                return Vec::new();
            }
            let values: Vec<f64> = candidates
                .iter()
                .filter_map(|(_, c)| c.as_f64())
                .collect();
            rule.outlier_positions(&values)
                .into_iter()
                .map(|pos| candidates[pos].0)
                .collect()
        } else {
            let majority = majority_value(candidates.iter().map(|(_, c)| *c));
            candidates
                .iter()
                .filter(|(_, c)| Some(*c) != majority)
                .map(|(row, _)| *row)
                .collect()
        }
    }

    fn promotes_ints(&self) -> bool {
        self.histogram.contains_key(&CellType::Float)
    }

    fn rows_where<F>(&self, mut predicate: F) -> Vec<usize>
    where
        F: FnMut(&Cell) -> bool,
    {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| predicate(*c))
            .map(|(i, _)| i)
            .collect()
    }
}

fn effective_type(t: CellType, promote_ints: bool) -> CellType {
    if promote_ints && t == CellType::Int {
        CellType::Float
    } else {
        t
    }
}

/// Most frequent value; ties go to the value encountered first.
fn majority_value<'a, I>(cells: I) -> Option<&'a Cell>
where
    I: Iterator<Item = &'a Cell>,
{
    let mut tally: Vec<(&'a Cell, usize)> = Vec::new();
    for cell in cells {
        match tally.iter_mut().find(|(c, _)| *c == cell) {
            Some((_, n)) => *n += 1,
            None => tally.push((cell, 1)),
        }
    }
    let mut best: Option<(&'a Cell, usize)> = None;
    for (c, n) in tally {
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((c, n));
        }
    }
    best.map(|(c, _)| c)
}
