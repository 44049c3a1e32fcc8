//! Typed storage for numeric arrays

use serde::{Deserialize, Serialize};

use super::Gather;

/// Element kind of a numeric array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

/// Column-major element storage, one vector per element kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum NumericData {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Apply the same expression to whichever vector a `NumericData` holds.
macro_rules! with_values {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            NumericData::Int8($values) => $body,
            NumericData::UInt8($values) => $body,
            NumericData::Int16($values) => $body,
            NumericData::UInt16($values) => $body,
            NumericData::Int32($values) => $body,
            NumericData::UInt32($values) => $body,
            NumericData::Int64($values) => $body,
            NumericData::UInt64($values) => $body,
            NumericData::Float32($values) => $body,
            NumericData::Float64($values) => $body,
        }
    };
}

/// Gather from same-kind parts and rewrap in that kind.
macro_rules! gather_kind {
    ($parts:expr, $order:expr, $($variant:ident),+) => {
        match $parts.first()? {
            $(NumericData::$variant(_) => {
                let slices = $parts
                    .iter()
                    .map(|part| match part {
                        NumericData::$variant(values) => Some(values),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                <Vec<_> as Gather>::gather(slices.as_slice(), $order).map(NumericData::$variant)
            })+
        }
    };
}

impl NumericData {
    /// Number of stored elements
    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    /// Check whether no elements are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element kind of the stored vector
    pub fn kind(&self) -> NumericKind {
        match self {
            NumericData::Int8(_) => NumericKind::Int8,
            NumericData::UInt8(_) => NumericKind::UInt8,
            NumericData::Int16(_) => NumericKind::Int16,
            NumericData::UInt16(_) => NumericKind::UInt16,
            NumericData::Int32(_) => NumericKind::Int32,
            NumericData::UInt32(_) => NumericKind::UInt32,
            NumericData::Int64(_) => NumericKind::Int64,
            NumericData::UInt64(_) => NumericKind::UInt64,
            NumericData::Float32(_) => NumericKind::Float32,
            NumericData::Float64(_) => NumericKind::Float64,
        }
    }
}

impl Gather for NumericData {
    fn gather(parts: &[&Self], order: &[(usize, usize)]) -> Option<Self> {
        gather_kind!(
            parts, order, Int8, UInt8, Int16, UInt16, Int32, UInt32, Int64, UInt64, Float32,
            Float64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_len() {
        let data = NumericData::Int16(vec![1, 2, 3]);
        assert_eq!(data.kind(), NumericKind::Int16);
        assert_eq!(data.len(), 3);
        assert!(!data.is_empty());
        assert!(NumericData::Float64(vec![]).is_empty());
    }

    #[test]
    fn test_gather_interleaves_parts() {
        let a = NumericData::Int32(vec![1, 2]);
        let b = NumericData::Int32(vec![3, 4]);
        let merged = NumericData::gather(&[&a, &b], &[(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(merged, Some(NumericData::Int32(vec![1, 3, 2, 4])));
    }

    #[test]
    fn test_gather_rejects_mixed_kinds() {
        let a = NumericData::Int32(vec![1]);
        let b = NumericData::Float64(vec![2.0]);
        assert_eq!(NumericData::gather(&[&a, &b], &[(0, 0), (1, 0)]), None);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(NumericData::UInt16(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "uint16", "values": [1, 2] }));
    }
}
