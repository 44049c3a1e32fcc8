//! Dimension folding
//!
//! BSON has no N-dimensional arrays. Before emission every value whose shape
//! is not flat (see [`Dims::is_flat`]) is split into a row cell of slices:
//! - a matrix `[r, c]` becomes `r` row vectors `[1, c]`
//! - a rank-N array becomes one slice per index of its last dimension, each
//!   with the leading N-1 dimensions, folded again until flat
//!
//! Folding is structural and treats every array variant the same way.

use std::borrow::Cow;

use crate::error::{CodecError, Result};
use crate::value::{check_shape, CellArray, Dims, DynamicValue};

/// Fold `value` into nested row cells until every leaf is flat
///
/// # Returns
/// * `Result<Cow<DynamicValue>>` - The value itself when already flat,
///   otherwise a row `CellArray` of folded slices
pub fn fold(value: &DynamicValue) -> Result<Cow<'_, DynamicValue>> {
    let dims = value
        .dims()
        .ok_or_else(|| CodecError::UnsupportedType(value.class_name().to_string()))?;
    if dims.is_flat() {
        return Ok(Cow::Borrowed(value));
    }
    // slice indices are built from the declared dims
    check_shape(dims, stored_len(value))?;

    let slices = if dims.rank() == 2 {
        row_slices(dims)
    } else {
        trailing_slices(dims)
    };

    let elements = slices
        .into_iter()
        .map(|(indices, slice_dims)| -> Result<DynamicValue> {
            let slice = value.select(&indices, slice_dims).ok_or_else(|| {
                CodecError::ConversionFailure(format!(
                    "{} array of dimensions {dims} cannot be sliced",
                    value.class_name()
                ))
            })?;
            Ok(fold(&slice)?.into_owned())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Cow::Owned(DynamicValue::Cell(CellArray::row(elements))))
}

/// Rows of a column-major matrix: row `i` holds elements `i + j*r`
fn row_slices(dims: &Dims) -> Vec<(Vec<usize>, Dims)> {
    let (rows, cols) = (dims.as_slice()[0], dims.as_slice()[1]);
    (0..rows)
        .map(|i| ((0..cols).map(|j| i + j * rows).collect(), Dims::row(cols)))
        .collect()
}

/// Contiguous chunks along the last dimension
fn trailing_slices(dims: &Dims) -> Vec<(Vec<usize>, Dims)> {
    let extents = dims.as_slice();
    let (leading, last) = extents.split_at(extents.len() - 1);
    let slice_dims = Dims::new(leading.to_vec());
    let stride = slice_dims.numel();
    (0..last[0])
        .map(|i| ((i * stride..(i + 1) * stride).collect(), slice_dims.clone()))
        .collect()
}

fn stored_len(value: &DynamicValue) -> usize {
    match value {
        DynamicValue::Numeric(a) => a.data.len(),
        DynamicValue::Logical(a) => a.data.len(),
        DynamicValue::Text(a) => a.data.len(),
        DynamicValue::Cell(a) => a.elements.len(),
        DynamicValue::Record(a) => a.records.len(),
        DynamicValue::Date(a) => a.data.len(),
        DynamicValue::Opaque(_) => 0,
    }
}
