//! Dynamic value model
//!
//! This module defines the closed set of host-side values the codec
//! transcodes:
//! - Typed numeric arrays of any rank (`NumericArray`)
//! - Logical, text and date arrays
//! - Heterogeneous cell arrays and named-field record arrays
//! - Opaque host values, which exist only to be rejected by the encoder
//!
//! Every array stores its elements column-major (first index fastest) and
//! carries a [`Dims`] whose element count matches its storage.

pub mod date;
mod numeric;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

pub use numeric::{NumericData, NumericKind};

/// Storage that can be rebuilt from elements of one or more same-typed parts
pub(crate) trait Gather: Sized {
    /// Build storage holding element `index` of `parts[part]` for every
    /// `(part, index)` in `order`; `None` if a pair is out of range or the
    /// parts disagree on element type.
    fn gather(parts: &[&Self], order: &[(usize, usize)]) -> Option<Self>;
}

impl<T: Clone> Gather for Vec<T> {
    fn gather(parts: &[&Self], order: &[(usize, usize)]) -> Option<Self> {
        order
            .iter()
            .map(|&(part, index)| parts.get(part)?.get(index).cloned())
            .collect()
    }
}

/// Array dimensions
///
/// Always holds at least two extents. Trailing extents of 1 beyond the
/// second are dropped, so `[2, 3, 1]` and `[2, 3]` are the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<usize>", into = "Vec<usize>")]
pub struct Dims(Vec<usize>);

impl Dims {
    /// Create normalized dimensions
    ///
    /// An empty list is the empty shape `[0, 0]`; a single extent `n` is the
    /// row vector `[1, n]`.
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        let mut dims = dims.into();
        match dims.len() {
            0 => dims = vec![0, 0],
            1 => dims.insert(0, 1),
            _ => {}
        }
        while dims.len() > 2 && dims.last() == Some(&1) {
            dims.pop();
        }
        Self(dims)
    }

    /// The `[1, 1]` shape
    pub fn scalar() -> Self {
        Self(vec![1, 1])
    }

    /// The `[1, len]` shape
    pub fn row(len: usize) -> Self {
        Self(vec![1, len])
    }

    /// The `[0, 0]` shape
    pub fn empty() -> Self {
        Self(vec![0, 0])
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of elements described by these dimensions, saturating at
    /// `usize::MAX`
    pub fn numel(&self) -> usize {
        self.0.iter().fold(1usize, |acc, &d| acc.saturating_mul(d))
    }

    /// Check for the `[1, 1]` shape
    pub fn is_scalar(&self) -> bool {
        self.0 == [1, 1]
    }

    /// Check for a rank-2 shape whose first extent is 1
    pub fn is_row_vector(&self) -> bool {
        self.0.len() == 2 && self.0[0] == 1
    }

    /// Check for a rank-2 shape with at most one extent above 1
    ///
    /// Values with such shapes are emitted directly; everything else is
    /// folded into nested arrays first.
    pub fn is_flat(&self) -> bool {
        self.0.len() == 2 && (self.0[0] <= 1 || self.0[1] <= 1)
    }

    /// These dimensions with one more trailing extent
    pub fn appended(&self, extent: usize) -> Self {
        let mut dims = self.0.clone();
        dims.push(extent);
        Self::new(dims)
    }
}

impl From<Vec<usize>> for Dims {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<Dims> for Vec<usize> {
    fn from(dims: Dims) -> Self {
        dims.0
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join("x"))
    }
}

/// Fail unless `dims` describes exactly `len` elements
pub(crate) fn check_shape(dims: &Dims, len: usize) -> Result<()> {
    if dims.numel() == len {
        Ok(())
    } else {
        Err(CodecError::ConversionFailure(format!(
            "dimensions {dims} describe {} elements but {len} are stored",
            dims.numel()
        ))
        .into())
    }
}

/// Typed numeric array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericArray {
    pub dims: Dims,
    pub data: NumericData,
}

impl NumericArray {
    pub fn new(dims: Dims, data: NumericData) -> Result<Self> {
        check_shape(&dims, data.len())?;
        Ok(Self { dims, data })
    }

    /// The `[0, 0]` double array
    pub fn empty() -> Self {
        Self {
            dims: Dims::empty(),
            data: NumericData::Float64(Vec::new()),
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Dims::scalar(),
            data: NumericData::Float64(vec![value]),
        }
    }

    /// Row vector holding `data`
    pub fn row(data: NumericData) -> Self {
        Self {
            dims: Dims::row(data.len()),
            data,
        }
    }

    pub fn kind(&self) -> NumericKind {
        self.data.kind()
    }
}

/// Logical (boolean) array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalArray {
    pub dims: Dims,
    pub data: Vec<bool>,
}

impl LogicalArray {
    pub fn new(dims: Dims, data: Vec<bool>) -> Result<Self> {
        check_shape(&dims, data.len())?;
        Ok(Self { dims, data })
    }

    pub fn scalar(value: bool) -> Self {
        Self {
            dims: Dims::scalar(),
            data: vec![value],
        }
    }

    pub fn row(data: Vec<bool>) -> Self {
        Self {
            dims: Dims::row(data.len()),
            data,
        }
    }
}

/// Character array holding UTF-8 code units
///
/// A `[1, n]` text array is a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextArray {
    pub dims: Dims,
    #[serde(with = "utf8_units")]
    pub data: Vec<u8>,
}

impl TextArray {
    pub fn new(dims: Dims, data: Vec<u8>) -> Result<Self> {
        check_shape(&dims, data.len())?;
        Ok(Self { dims, data })
    }

    /// String value; the empty string has shape `[0, 0]`
    pub fn string(text: &str) -> Self {
        let dims = if text.is_empty() {
            Dims::empty()
        } else {
            Dims::row(text.len())
        };
        Self {
            dims,
            data: text.as_bytes().to_vec(),
        }
    }

    /// Stored code units as text, if they are valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// Heterogeneous, order-significant container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellArray {
    pub dims: Dims,
    pub elements: Vec<DynamicValue>,
}

impl CellArray {
    pub fn new(dims: Dims, elements: Vec<DynamicValue>) -> Result<Self> {
        check_shape(&dims, elements.len())?;
        Ok(Self { dims, elements })
    }

    pub fn row(elements: Vec<DynamicValue>) -> Self {
        Self {
            dims: Dims::row(elements.len()),
            elements,
        }
    }
}

/// Array of records sharing one ordered list of field names
///
/// `records[i][f]` is the value of field `fields[f]` in element `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordArray {
    pub dims: Dims,
    pub fields: Vec<String>,
    pub records: Vec<Vec<DynamicValue>>,
}

impl RecordArray {
    pub fn new(dims: Dims, fields: Vec<String>, records: Vec<Vec<DynamicValue>>) -> Result<Self> {
        check_shape(&dims, records.len())?;
        if let Some(record) = records.iter().find(|r| r.len() != fields.len()) {
            return Err(CodecError::ConversionFailure(format!(
                "record holds {} values for {} fields",
                record.len(),
                fields.len()
            ))
            .into());
        }
        Ok(Self {
            dims,
            fields,
            records,
        })
    }

    /// Single record built from `(name, value)` pairs
    pub fn single<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, DynamicValue)>,
        S: Into<String>,
    {
        let (fields, values): (Vec<String>, Vec<DynamicValue>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self {
            dims: Dims::scalar(),
            fields,
            records: vec![values],
        }
    }

    /// Value of field `name` in element `index`
    pub fn get(&self, index: usize, name: &str) -> Option<&DynamicValue> {
        let field = self.fields.iter().position(|f| f == name)?;
        self.records.get(index)?.get(field)
    }
}

/// Array of date numbers (fractional days, see [`date`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateArray {
    pub dims: Dims,
    pub data: Vec<f64>,
}

impl DateArray {
    pub fn new(dims: Dims, data: Vec<f64>) -> Result<Self> {
        check_shape(&dims, data.len())?;
        Ok(Self { dims, data })
    }

    pub fn scalar(days: f64) -> Self {
        Self {
            dims: Dims::scalar(),
            data: vec![days],
        }
    }

    /// Stored dates as UTC datetimes; `None` if any is out of range
    pub fn to_datetimes(&self) -> Option<Vec<DateTime<Utc>>> {
        self.data.iter().map(|&days| date::to_datetime(days)).collect()
    }
}

/// Host value outside the transcodable set (function handle, sparse matrix,
/// object instance)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueValue {
    pub class_name: String,
}

/// A dynamically typed host value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum DynamicValue {
    Numeric(NumericArray),
    Logical(LogicalArray),
    Text(TextArray),
    Cell(CellArray),
    Record(RecordArray),
    Date(DateArray),
    Opaque(OpaqueValue),
}

impl DynamicValue {
    /// The empty double array, used for null and absent input
    pub fn empty() -> Self {
        DynamicValue::Numeric(NumericArray::empty())
    }

    /// Double scalar
    pub fn scalar(value: f64) -> Self {
        DynamicValue::Numeric(NumericArray::scalar(value))
    }

    /// String value
    pub fn text(text: &str) -> Self {
        DynamicValue::Text(TextArray::string(text))
    }

    /// Dimensions of the value; `None` for opaque values
    pub fn dims(&self) -> Option<&Dims> {
        match self {
            DynamicValue::Numeric(a) => Some(&a.dims),
            DynamicValue::Logical(a) => Some(&a.dims),
            DynamicValue::Text(a) => Some(&a.dims),
            DynamicValue::Cell(a) => Some(&a.dims),
            DynamicValue::Record(a) => Some(&a.dims),
            DynamicValue::Date(a) => Some(&a.dims),
            DynamicValue::Opaque(_) => None,
        }
    }

    /// Runtime class name; numeric values report their element kind
    pub fn class_name(&self) -> &str {
        match self {
            DynamicValue::Numeric(a) => match a.kind() {
                NumericKind::Int8 => "int8",
                NumericKind::UInt8 => "uint8",
                NumericKind::Int16 => "int16",
                NumericKind::UInt16 => "uint16",
                NumericKind::Int32 => "int32",
                NumericKind::UInt32 => "uint32",
                NumericKind::Int64 => "int64",
                NumericKind::UInt64 => "uint64",
                NumericKind::Float32 => "single",
                NumericKind::Float64 => "double",
            },
            DynamicValue::Logical(_) => "logical",
            DynamicValue::Text(_) => "char",
            DynamicValue::Cell(_) => "cell",
            DynamicValue::Record(_) => "struct",
            DynamicValue::Date(_) => "datetime",
            DynamicValue::Opaque(o) => &o.class_name,
        }
    }

    /// Copy of the elements at `indices`, reshaped to `dims`
    ///
    /// Returns `None` for opaque values or out-of-range indices.
    pub(crate) fn select(&self, indices: &[usize], dims: Dims) -> Option<DynamicValue> {
        let order: Vec<(usize, usize)> = indices.iter().map(|&i| (0, i)).collect();
        let value = match self {
            DynamicValue::Numeric(a) => DynamicValue::Numeric(NumericArray {
                dims,
                data: NumericData::gather(&[&a.data], &order)?,
            }),
            DynamicValue::Logical(a) => DynamicValue::Logical(LogicalArray {
                dims,
                data: Vec::gather(&[&a.data], &order)?,
            }),
            DynamicValue::Text(a) => DynamicValue::Text(TextArray {
                dims,
                data: Vec::gather(&[&a.data], &order)?,
            }),
            DynamicValue::Cell(a) => DynamicValue::Cell(CellArray {
                dims,
                elements: Vec::gather(&[&a.elements], &order)?,
            }),
            DynamicValue::Record(a) => DynamicValue::Record(RecordArray {
                dims,
                fields: a.fields.clone(),
                records: Vec::gather(&[&a.records], &order)?,
            }),
            DynamicValue::Date(a) => DynamicValue::Date(DateArray {
                dims,
                data: Vec::gather(&[&a.data], &order)?,
            }),
            DynamicValue::Opaque(_) => return None,
        };
        Some(value)
    }
}

impl From<NumericArray> for DynamicValue {
    fn from(array: NumericArray) -> Self {
        DynamicValue::Numeric(array)
    }
}

impl From<LogicalArray> for DynamicValue {
    fn from(array: LogicalArray) -> Self {
        DynamicValue::Logical(array)
    }
}

impl From<TextArray> for DynamicValue {
    fn from(array: TextArray) -> Self {
        DynamicValue::Text(array)
    }
}

impl From<CellArray> for DynamicValue {
    fn from(array: CellArray) -> Self {
        DynamicValue::Cell(array)
    }
}

impl From<RecordArray> for DynamicValue {
    fn from(array: RecordArray) -> Self {
        DynamicValue::Record(array)
    }
}

impl From<DateArray> for DynamicValue {
    fn from(array: DateArray) -> Self {
        DynamicValue::Date(array)
    }
}

/// Text storage serializes as a string when it is valid UTF-8 and as a list
/// of code units otherwise.
mod utf8_units {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Units {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(data) {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => data.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(match Units::deserialize(deserializer)? {
            Units::Text(text) => text.into_bytes(),
            Units::Bytes(bytes) => bytes,
        })
    }
}
