//! Matrix shape inference for nested sequences.

use serde_json::Value;

use crate::types::{ElementType, MatrixDescriptor, ScalarType};

/// Determine whether `items` forms a complete matrix and return its descriptor.
///
/// A matrix is a nest of sequences where every sequence at a given depth has the same length and
/// every leaf has the same type. Mappings are valid leaves of type [`ElementType::Object`]; their
/// contents are not inspected here. Returns `None` when the sequence is jagged, mixes sequences
/// with non-sequences at one level, or mixes leaf types.
///
/// The nest is processed one depth level at a time with an explicit worklist, so input depth
/// never grows the call stack. Requiring every sibling sub-matrix to agree is equivalent to
/// requiring every node on the same level to agree in length and kind.
///
/// ```
/// use rust_data_qc::aggregation::classify_matrix;
/// use rust_data_qc::types::{ElementType, ScalarType};
///
/// let m = serde_json::json!([[1.5, 2.5], [3.5, 4.5], [5.5, 6.5]]);
/// let d = classify_matrix(m.as_array().unwrap()).unwrap();
/// assert_eq!(d.shape, vec![3, 2]);
/// assert_eq!(d.element, ElementType::Scalar(ScalarType::Float));
///
/// let jagged = serde_json::json!([[1, 2], [3]]);
/// assert!(classify_matrix(jagged.as_array().unwrap()).is_none());
/// ```
pub fn classify_matrix(items: &[Value]) -> Option<MatrixDescriptor> {
    let mut shape = Vec::new();
    let mut level: Vec<&[Value]> = vec![items];

    loop {
        let len = level[0].len();
        if level.iter().any(|node| node.len() != len) {
            return None;
        }
        shape.push(len);

        if len == 0 {
            return Some(MatrixDescriptor::new(shape, ElementType::Indeterminate));
        }

        let nested = level[0][0].is_array();
        let mut next: Vec<&[Value]> = Vec::with_capacity(if nested { level.len() * len } else { 0 });
        let mut leaf: Option<ElementType> = None;

        for node in &level {
            for v in node.iter() {
                match (v, nested) {
                    (Value::Array(child), true) => next.push(child.as_slice()),
                    (Value::Array(_), false) => return None,
                    (_, true) => return None,
                    (_, false) => {
                        let t = leaf_type(v);
                        match leaf {
                            None => leaf = Some(t),
                            Some(prev) if prev != t => return None,
                            Some(_) => {}
                        }
                    }
                }
            }
        }

        if let Some(element) = leaf {
            return Some(MatrixDescriptor::new(shape, element));
        }
        level = next;
    }
}

fn leaf_type(v: &Value) -> ElementType {
    match ScalarType::of(v) {
        Some(t) => ElementType::Scalar(t),
        None => ElementType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::classify_matrix;
    use crate::types::{ElementType, MatrixDescriptor, ScalarType};
    use serde_json::{json, Value};

    fn classify(v: &Value) -> Option<MatrixDescriptor> {
        classify_matrix(v.as_array().expect("test input must be an array"))
    }

    #[test]
    fn three_dimensional_float_matrix() {
        let row = json!([1.0, 2.0, 3.0, 4.5]);
        let plane = json!([row.clone(), row.clone()]);
        let m = json!([plane.clone(), plane.clone(), plane]);
        let d = classify(&m).unwrap();
        assert_eq!(d.shape, vec![3, 2, 4]);
        assert_eq!(d.element, ElementType::Scalar(ScalarType::Float));
    }

    #[test]
    fn jagged_sequence_is_invalid() {
        assert!(classify(&json!([[1, 2], [3]])).is_none());
        assert!(classify(&json!([[[1], [2]], [[3], [4, 5]]])).is_none());
    }

    #[test]
    fn mixed_leaf_types_are_invalid() {
        assert!(classify(&json!([1, "a"])).is_none());
        assert!(classify(&json!([1, 2.5])).is_none());
        assert!(classify(&json!([[1, 2], [3, true]])).is_none());
    }

    #[test]
    fn mixing_sequences_and_scalars_is_invalid() {
        assert!(classify(&json!([[1], 2])).is_none());
        assert!(classify(&json!([1, [2]])).is_none());
        assert!(classify(&json!([{"a": 1}, [2]])).is_none());
    }

    #[test]
    fn object_leaves_form_an_object_matrix() {
        let m = json!([[{"a": 1}, {"b": 2}], [{"c": 3}, {"d": [1, "x"]}]]);
        let d = classify(&m).unwrap();
        assert_eq!(d.shape, vec![2, 2]);
        assert_eq!(d.element, ElementType::Object);
    }

    #[test]
    fn null_leaves_are_a_uniform_type() {
        let d = classify(&json!([null, null])).unwrap();
        assert_eq!(d.element, ElementType::Scalar(ScalarType::Missing));
    }

    #[test]
    fn empty_axes_are_indeterminate() {
        assert_eq!(classify(&json!([])).unwrap(), MatrixDescriptor::indeterminate());
        let d = classify(&json!([[], []])).unwrap();
        assert_eq!(d.shape, vec![2, 0]);
        assert_eq!(d.element, ElementType::Indeterminate);
        assert!(classify(&json!([[], [1]])).is_none());
    }

    #[test]
    fn classification_is_deterministic() {
        let m = json!([["a", "b"], ["c", "d"]]);
        assert_eq!(classify(&m), classify(&m));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let mut v = json!([1]);
        for _ in 0..5_000 {
            v = Value::Array(vec![v]);
        }
        let d = classify(&v).unwrap();
        assert_eq!(d.rank(), 5_001);
        assert!(d.shape.iter().all(|&n| n == 1));
        // serde_json drops nested arrays recursively; unwind by hand.
        let mut cur = v;
        while let Value::Array(mut items) = cur {
            cur = items.pop().unwrap_or(Value::Null);
        }
    }
}
