//! Merge engine
//!
//! Reverses folding: a cell whose elements all share one class and one
//! shape is rebuilt as a single array.
//! - numeric, logical and cell elements of shape `[1, k]` stack as the rows
//!   of a `[count, k]` array
//! - record and date scalars line up as a `[1, count]` row
//! - any other shape `d` is concatenated into `d ++ [count]`
//!
//! Text is never merged. Anything that does not qualify is returned as is.

use tracing::debug;

use crate::value::{
    CellArray, DateArray, Dims, DynamicValue, Gather, LogicalArray, NumericArray, NumericData,
    RecordArray,
};

/// Merge the elements of a cell into one array when they are compatible
///
/// # Arguments
/// * `value` - Candidate value; only cells are considered
///
/// # Returns
/// * `DynamicValue` - The merged array, or `value` unchanged
pub fn try_merge(value: DynamicValue) -> DynamicValue {
    let cell = match value {
        DynamicValue::Cell(cell) => cell,
        other => return other,
    };
    if cell.elements.is_empty() {
        return DynamicValue::Cell(cell);
    }

    match merge_elements(&cell.elements) {
        Some(merged) => merged,
        None => {
            debug!(
                elements = cell.elements.len(),
                "cell kept: elements differ in class or shape"
            );
            DynamicValue::Cell(cell)
        }
    }
}

fn merge_elements(elements: &[DynamicValue]) -> Option<DynamicValue> {
    let first = elements.first()?;
    let dims = first.dims()?;
    let uniform = elements
        .iter()
        .all(|e| e.class_name() == first.class_name() && e.dims() == Some(dims));
    if !uniform {
        return None;
    }

    let count = elements.len();
    let merged = match first {
        DynamicValue::Numeric(_) => {
            let parts = elements
                .iter()
                .map(|e| match e {
                    DynamicValue::Numeric(a) => Some(&a.data),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            let (order, dims) = stacked(dims, count);
            DynamicValue::Numeric(NumericArray {
                data: NumericData::gather(parts.as_slice(), &order)?,
                dims,
            })
        }
        DynamicValue::Logical(_) => {
            let parts = elements
                .iter()
                .map(|e| match e {
                    DynamicValue::Logical(a) => Some(&a.data),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            let (order, dims) = stacked(dims, count);
            DynamicValue::Logical(LogicalArray {
                data: Vec::gather(parts.as_slice(), &order)?,
                dims,
            })
        }
        DynamicValue::Cell(_) => {
            let parts = elements
                .iter()
                .map(|e| match e {
                    DynamicValue::Cell(a) => Some(&a.elements),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            let (order, dims) = stacked(dims, count);
            DynamicValue::Cell(CellArray {
                elements: Vec::gather(parts.as_slice(), &order)?,
                dims,
            })
        }
        DynamicValue::Record(head) => {
            let parts = elements
                .iter()
                .map(|e| match e {
                    DynamicValue::Record(a) if a.fields == head.fields => Some(&a.records),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            let (order, dims) = lined_up(dims, count);
            DynamicValue::Record(RecordArray {
                fields: head.fields.clone(),
                records: Vec::gather(parts.as_slice(), &order)?,
                dims,
            })
        }
        DynamicValue::Date(_) => {
            let parts = elements
                .iter()
                .map(|e| match e {
                    DynamicValue::Date(a) => Some(&a.data),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            let (order, dims) = lined_up(dims, count);
            DynamicValue::Date(DateArray {
                data: Vec::gather(parts.as_slice(), &order)?,
                dims,
            })
        }
        DynamicValue::Text(_) | DynamicValue::Opaque(_) => return None,
    };
    Some(merged)
}

/// Gather order and shape for `count` parts of shape `dims`
type Layout = (Vec<(usize, usize)>, Dims);

/// Row vectors `[1, k]` become the rows of `[count, k]`
fn stacked(dims: &Dims, count: usize) -> Layout {
    if !dims.is_row_vector() {
        return appended(dims, count);
    }
    let k = dims.as_slice()[1];
    let order = (0..count * k).map(|p| (p % count, p / count)).collect();
    (order, Dims::new(vec![count, k]))
}

/// Scalars become `[1, count]`, other shapes stack like [`stacked`]
fn lined_up(dims: &Dims, count: usize) -> Layout {
    if dims.is_scalar() {
        return ((0..count).map(|p| (p, 0)).collect(), Dims::row(count));
    }
    stacked(dims, count)
}

/// Parts laid end to end along a new trailing dimension
fn appended(dims: &Dims, count: usize) -> Layout {
    let per = dims.numel();
    let order = (0..per * count).map(|p| (p / per, p % per)).collect();
    (order, dims.appended(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[f64]) -> DynamicValue {
        DynamicValue::Numeric(NumericArray::row(NumericData::Float64(values.to_vec())))
    }

    fn cell(elements: Vec<DynamicValue>) -> DynamicValue {
        DynamicValue::Cell(CellArray::row(elements))
    }

    #[test]
    fn test_rows_stack_column_major() {
        let merged = try_merge(cell(vec![row(&[1.0, 2.0, 3.0]), row(&[4.0, 5.0, 6.0])]));
        assert_eq!(
            merged,
            DynamicValue::Numeric(
                NumericArray::new(
                    Dims::new(vec![2, 3]),
                    NumericData::Float64(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0])
                )
                .unwrap()
            )
        );
    }

    #[test]
    fn test_matrices_gain_trailing_dimension() {
        let matrix = |offset: i32| {
            DynamicValue::Numeric(
                NumericArray::new(
                    Dims::new(vec![2, 2]),
                    NumericData::Int32((offset..offset + 4).collect()),
                )
                .unwrap(),
            )
        };
        let merged = try_merge(cell(vec![matrix(0), matrix(4), matrix(8)]));
        assert_eq!(
            merged,
            DynamicValue::Numeric(
                NumericArray::new(
                    Dims::new(vec![2, 2, 3]),
                    NumericData::Int32((0..12).collect())
                )
                .unwrap()
            )
        );
    }

    #[test]
    fn test_mismatch_left_alone() {
        let mixed_shapes = cell(vec![row(&[1.0]), row(&[1.0, 2.0])]);
        assert_eq!(try_merge(mixed_shapes.clone()), mixed_shapes);

        let mixed_kinds = cell(vec![
            row(&[1.0]),
            DynamicValue::Numeric(NumericArray::row(NumericData::Int64(vec![1]))),
        ]);
        assert_eq!(try_merge(mixed_kinds.clone()), mixed_kinds);

        let text = cell(vec![DynamicValue::text("ab"), DynamicValue::text("cd")]);
        assert_eq!(try_merge(text.clone()), text);

        let empty = cell(vec![]);
        assert_eq!(try_merge(empty.clone()), empty);
    }

    #[test]
    fn test_record_scalars_line_up() {
        let rec = |v: f64| DynamicValue::Record(RecordArray::single([("a", DynamicValue::scalar(v))]));
        let merged = try_merge(cell(vec![rec(1.0), rec(2.0)]));
        match merged {
            DynamicValue::Record(array) => {
                assert_eq!(array.dims, Dims::row(2));
                assert_eq!(array.get(1, "a"), Some(&DynamicValue::scalar(2.0)));
            }
            other => panic!("expected struct, got {}", other.class_name()),
        }

        let other_fields =
            DynamicValue::Record(RecordArray::single([("b", DynamicValue::scalar(1.0))]));
        let mixed = cell(vec![rec(1.0), other_fields]);
        assert_eq!(try_merge(mixed.clone()), mixed);
    }

    #[test]
    fn test_dates_line_up() {
        let merged = try_merge(cell(vec![
            DynamicValue::Date(DateArray::scalar(1.0)),
            DynamicValue::Date(DateArray::scalar(2.0)),
        ]));
        assert_eq!(
            merged,
            DynamicValue::Date(DateArray::new(Dims::row(2), vec![1.0, 2.0]).unwrap())
        );
    }

    #[test]
    fn test_date_rows_stack() {
        let dates = |a: f64, b: f64| DynamicValue::Date(DateArray::new(Dims::row(2), vec![a, b]).unwrap());
        let merged = try_merge(cell(vec![dates(1.0, 2.0), dates(3.0, 4.0), dates(5.0, 6.0)]));
        assert_eq!(
            merged,
            DynamicValue::Date(
                DateArray::new(Dims::new(vec![3, 2]), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]).unwrap()
            )
        );
    }

    #[test]
    fn test_record_matrices_gain_trailing_dimension() {
        let block = |offset: f64| {
            DynamicValue::Record(
                RecordArray::new(
                    Dims::new(vec![2, 2]),
                    vec!["a".into()],
                    (0..4)
                        .map(|i| vec![DynamicValue::scalar(offset + f64::from(i))])
                        .collect(),
                )
                .unwrap(),
            )
        };
        match try_merge(cell(vec![block(0.0), block(10.0)])) {
            DynamicValue::Record(array) => {
                assert_eq!(array.dims, Dims::new(vec![2, 2, 2]));
                assert_eq!(array.get(3, "a"), Some(&DynamicValue::scalar(3.0)));
                assert_eq!(array.get(4, "a"), Some(&DynamicValue::scalar(10.0)));
            }
            other => panic!("expected struct, got {}", other.class_name()),
        }
    }

    #[test]
    fn test_cell_rows_stack() {
        let pair = |name: &str, v: f64| cell(vec![DynamicValue::text(name), DynamicValue::scalar(v)]);
        let merged = try_merge(cell(vec![pair("a", 1.0), pair("b", 2.0)]));
        assert_eq!(
            merged,
            DynamicValue::Cell(
                CellArray::new(
                    Dims::new(vec![2, 2]),
                    vec![
                        DynamicValue::text("a"),
                        DynamicValue::text("b"),
                        DynamicValue::scalar(1.0),
                        DynamicValue::scalar(2.0),
                    ]
                )
                .unwrap()
            )
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = try_merge(cell(vec![row(&[1.0, 2.0]), row(&[3.0, 4.0])]));
        assert_eq!(try_merge(once.clone()), once);
    }

    #[test]
    fn test_non_cell_passthrough() {
        let value = row(&[1.0]);
        assert_eq!(try_merge(value.clone()), value);
    }
}
