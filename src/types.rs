//! Core data model types for aggregation.
//!
//! Documents are plain [`serde_json::Value`] trees. Flattening turns every leaf or matrix in a
//! document into a typed [`Cell`], and every cell belongs to a column keyed by its path.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Type tag of a single leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// JSON `null`.
    Missing,
    /// Boolean.
    Bool,
    /// Integer representable as a 64-bit signed integer.
    Int,
    /// Any other number.
    Float,
    /// UTF-8 string.
    Str,
}

impl ScalarType {
    /// Classify a leaf value.
    ///
    /// Returns `None` for sequences and mappings, which are not scalars.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Missing),
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(n) if n.is_i64() => Some(Self::Int),
            Value::Number(_) => Some(Self::Float),
            Value::String(_) => Some(Self::Str),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Missing => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
        }
    }
}

/// Component type of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Every leaf is a scalar of this type.
    Scalar(ScalarType),
    /// Every leaf is a mapping.
    Object,
    /// The matrix has a zero-length axis, so no leaf was available to inspect.
    Indeterminate,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(t) => f.write_str(t.name()),
            Self::Object => f.write_str("object"),
            Self::Indeterminate => f.write_str("?"),
        }
    }
}

/// Shape and component type of a uniform nested sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MatrixDescriptor {
    /// Size of each axis, outermost first.
    pub shape: Vec<usize>,
    /// Common type of the leaves.
    pub element: ElementType,
}

impl MatrixDescriptor {
    /// Create a descriptor.
    pub fn new(shape: Vec<usize>, element: ElementType) -> Self {
        Self { shape, element }
    }

    /// Descriptor assigned to a zero-length sequence.
    pub fn indeterminate() -> Self {
        Self::new(vec![0], ElementType::Indeterminate)
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Whether this is a one-dimensional string vector, the only shape eligible for set cells.
    pub fn is_string_vector(&self) -> bool {
        self.rank() == 1 && self.element == ElementType::Scalar(ScalarType::Str)
    }
}

impl fmt::Display for MatrixDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, n) in self.shape.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{n}")?;
        }
        write!(f, "):{}", self.element)
    }
}

/// Type tag of a [`Cell`]; matrices and sets are tags of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Missing,
    Bool,
    Int,
    Float,
    Str,
    Matrix,
    Set,
}

impl CellType {
    /// Whether values of this type are compared by distribution rather than identity.
    pub fn is_quantitative(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// One observed value of one statistic for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// The statistic was absent (or `null`) for this file.
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Shape metadata of a matrix; the elements themselves are not retained.
    Matrix(MatrixDescriptor),
    /// A one-dimensional string vector whose elements are all distinct.
    Set(BTreeSet<String>),
}

impl Cell {
    /// Convert a scalar JSON value into a cell.
    ///
    /// Returns `None` for sequences and mappings.
    pub fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Missing),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Re-interpret a one-dimensional string vector as a set when all of its elements are
    /// distinct; otherwise keep the matrix descriptor.
    ///
    /// This is a deliberately lossy, narrow rule: the element order of a set cell is dropped.
    pub fn from_matrix(value: &Value, descriptor: &MatrixDescriptor) -> Self {
        if descriptor.is_string_vector() {
            if let Value::Array(items) = value {
                let set: BTreeSet<String> = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                if set.len() == descriptor.shape[0] {
                    return Self::Set(set);
                }
            }
        }
        Self::Matrix(descriptor.clone())
    }

    /// The cell's type tag.
    pub fn cell_type(&self) -> CellType {
        match self {
            Self::Missing => CellType::Missing,
            Self::Bool(_) => CellType::Bool,
            Self::Int(_) => CellType::Int,
            Self::Float(_) => CellType::Float,
            Self::Str(_) => CellType::Str,
            Self::Matrix(_) => CellType::Matrix,
            Self::Set(_) => CellType::Set,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric value of an `Int` or `Float` cell.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Matrix(m) => write!(f, "{m}"),
            Self::Set(s) => {
                f.write_str("{")?;
                for (i, item) in s.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(item)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, CellType, ElementType, MatrixDescriptor, ScalarType};
    use serde_json::json;

    #[test]
    fn scalar_type_covers_every_leaf() {
        assert_eq!(ScalarType::of(&json!(null)), Some(ScalarType::Missing));
        assert_eq!(ScalarType::of(&json!(true)), Some(ScalarType::Bool));
        assert_eq!(ScalarType::of(&json!(-3)), Some(ScalarType::Int));
        assert_eq!(ScalarType::of(&json!(2.5)), Some(ScalarType::Float));
        assert_eq!(ScalarType::of(&json!(u64::MAX)), Some(ScalarType::Float));
        assert_eq!(ScalarType::of(&json!("x")), Some(ScalarType::Str));
        assert_eq!(ScalarType::of(&json!([1])), None);
        assert_eq!(ScalarType::of(&json!({"a": 1})), None);
    }

    #[test]
    fn distinct_string_vector_becomes_a_set() {
        let v = json!(["a", "b", "c"]);
        let d = MatrixDescriptor::new(vec![3], ElementType::Scalar(ScalarType::Str));
        let cell = Cell::from_matrix(&v, &d);
        assert_eq!(cell.cell_type(), CellType::Set);
        assert_eq!(cell.to_string(), "{a,b,c}");
    }

    #[test]
    fn repeated_string_vector_stays_a_matrix() {
        let v = json!(["a", "a", "b"]);
        let d = MatrixDescriptor::new(vec![3], ElementType::Scalar(ScalarType::Str));
        assert_eq!(Cell::from_matrix(&v, &d), Cell::Matrix(d));
    }

    #[test]
    fn descriptor_display_lists_axes() {
        let d = MatrixDescriptor::new(vec![3, 2, 4], ElementType::Scalar(ScalarType::Float));
        assert_eq!(d.to_string(), "(3,2,4):float");
        assert_eq!(MatrixDescriptor::indeterminate().to_string(), "(0):?");
    }
}
