//! Decoder: BSON document to `DynamicValue`
//!
//! Every aggregate (the root document, sub-documents, arrays) is decoded in
//! two passes. The scan classifies the children:
//! - whether the keys are exactly `"0"`, `"1"`, ... (array-like)
//! - the unified [`TypeClass`] of the child element types
//! - whether every child is an int64, or every child a bool
//!
//! The build pass then picks the target shape: a record for keyed
//! documents, a numeric or logical row for scalar children, otherwise a cell
//! that is handed to the merge engine.

use bson::spec::ElementType;
use bson::{Bson, Document};
use tracing::trace;

use super::keys::sanitize;
use super::merge::try_merge;
use crate::config::CodecConfig;
use crate::document::Node;
use crate::error::{CodecError, Result};
use crate::value::{
    date, CellArray, DateArray, Dims, DynamicValue, LogicalArray, NumericArray, NumericData,
    RecordArray,
};

/// Coarse class of an element type, used to pick an aggregate's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// double, int32, int64 and bool
    Double,
    /// UTF-8 string
    Text,
    /// Binary blob
    Binary,
    /// Anything else, or a mix of classes
    Mixed,
}

impl TypeClass {
    /// Class of a single element type
    pub fn of(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Double
            | ElementType::Int32
            | ElementType::Int64
            | ElementType::Boolean => TypeClass::Double,
            ElementType::String => TypeClass::Text,
            ElementType::Binary => TypeClass::Binary,
            _ => TypeClass::Mixed,
        }
    }

    /// Class shared by two groups of elements
    pub fn unify(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            TypeClass::Mixed
        }
    }
}

/// Result of the classification pass over one aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scan {
    array_like: bool,
    class: Option<TypeClass>,
    all_int64: bool,
    all_bool: bool,
}

fn scan(node: Node<'_>) -> Scan {
    let mut result = Scan {
        array_like: true,
        class: None,
        all_int64: true,
        all_bool: true,
    };
    for (index, (key, value)) in node.elements().enumerate() {
        let element_type = value.element_type();
        result.array_like &= key == index.to_string();
        let class = TypeClass::of(element_type);
        result.class = Some(result.class.map_or(class, |c| c.unify(class)));
        result.all_int64 &= element_type == ElementType::Int64;
        result.all_bool &= element_type == ElementType::Boolean;
    }
    result
}

/// Converts BSON documents into dynamic values
#[derive(Debug, Clone)]
pub struct Decoder {
    max_depth: usize,
}

impl Decoder {
    /// Create a decoder honoring the limits in `config`
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    /// Decode a root document
    ///
    /// # Arguments
    /// * `doc` - Parsed root document
    ///
    /// # Returns
    /// * `Result<DynamicValue>` - Decoded value, or `MalformedDocument` if
    ///   any element cannot be represented
    pub fn decode(&self, doc: &Document) -> Result<DynamicValue> {
        self.decode_node(Node::Document(doc), 0)
    }

    fn decode_node(&self, node: Node<'_>, depth: usize) -> Result<DynamicValue> {
        if depth > self.max_depth {
            return Err(CodecError::MalformedDocument(format!(
                "document nests deeper than {} levels",
                self.max_depth
            ))
            .into());
        }

        if node.is_empty() {
            return Ok(DynamicValue::empty());
        }

        let summary = scan(node);
        trace!(elements = node.len(), depth, ?summary, "decoding aggregate");

        if !summary.array_like {
            return self.record(node, depth);
        }

        match summary.class {
            None => Ok(DynamicValue::empty()),
            Some(TypeClass::Double) => Ok(scalar_row(node, &summary)),
            Some(TypeClass::Text | TypeClass::Binary) if node.len() == 1 => {
                match node.elements().next() {
                    Some((_, value)) => self.decode_element(value, depth + 1),
                    None => Ok(DynamicValue::empty()),
                }
            }
            Some(_) => {
                let elements = node
                    .elements()
                    .map(|(_, value)| self.decode_element(value, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(try_merge(DynamicValue::Cell(CellArray::row(elements))))
            }
        }
    }

    /// Single record whose fields are the sanitized keys of `node`
    fn record(&self, node: Node<'_>, depth: usize) -> Result<DynamicValue> {
        let (keys, values): (Vec<_>, Vec<_>) = node.elements().unzip();
        let fields = sanitize(keys.as_slice())?;
        let values = values
            .into_iter()
            .map(|value| self.decode_element(value, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(DynamicValue::Record(RecordArray::new(
            Dims::scalar(),
            fields,
            vec![values],
        )?))
    }

    /// Decode one child element
    fn decode_element(&self, value: &Bson, depth: usize) -> Result<DynamicValue> {
        let decoded = match value {
            Bson::Document(doc) => return self.decode_node(Node::Document(doc), depth),
            Bson::Array(items) => return self.decode_node(Node::Array(items), depth),
            Bson::Double(v) => DynamicValue::scalar(*v),
            Bson::Int32(v) => DynamicValue::scalar(f64::from(*v)),
            Bson::Int64(v) => DynamicValue::Numeric(NumericArray::row(NumericData::Int64(vec![*v]))),
            Bson::Boolean(v) => DynamicValue::Logical(LogicalArray::scalar(*v)),
            Bson::String(text) | Bson::Symbol(text) => DynamicValue::text(text),
            Bson::Binary(binary) => {
                DynamicValue::Numeric(NumericArray::row(NumericData::UInt8(binary.bytes.clone())))
            }
            Bson::ObjectId(oid) => DynamicValue::text(&oid.to_hex()),
            Bson::DateTime(datetime) => {
                DynamicValue::Date(DateArray::scalar(date::millis_to_days(datetime.timestamp_millis())))
            }
            Bson::Timestamp(timestamp) => {
                DynamicValue::Date(DateArray::scalar(date::seconds_to_days(timestamp.time)))
            }
            Bson::Null | Bson::DbPointer(_) => DynamicValue::empty(),
            Bson::RegularExpression(regex) => DynamicValue::text(&regex.pattern),
            Bson::JavaScriptCode(code) => DynamicValue::text(code),
            Bson::JavaScriptCodeWithScope(code) => DynamicValue::text(&code.code),
            Bson::Undefined => DynamicValue::scalar(f64::NAN),
            Bson::MinKey => DynamicValue::scalar(f64::NEG_INFINITY),
            Bson::MaxKey => DynamicValue::scalar(f64::INFINITY),
            other => {
                return Err(CodecError::MalformedDocument(format!(
                    "unsupported element type {:?}",
                    other.element_type()
                ))
                .into());
            }
        };
        Ok(decoded)
    }
}

/// Row of scalar children: logical when every child is a bool, int64 when
/// every child is an int64, double otherwise
fn scalar_row(node: Node<'_>, summary: &Scan) -> DynamicValue {
    let values = node.elements().map(|(_, value)| value);
    if summary.all_bool {
        let data = values
            .map(|value| matches!(value, Bson::Boolean(true)))
            .collect();
        return DynamicValue::Logical(LogicalArray::row(data));
    }
    if summary.all_int64 {
        let data = values
            .map(|value| match value {
                Bson::Int64(v) => *v,
                _ => 0,
            })
            .collect();
        return DynamicValue::Numeric(NumericArray::row(NumericData::Int64(data)));
    }
    let data = values
        .map(|value| match value {
            Bson::Double(v) => *v,
            Bson::Int32(v) => f64::from(*v),
            Bson::Int64(v) => *v as f64,
            Bson::Boolean(v) => f64::from(u8::from(*v)),
            _ => f64::NAN,
        })
        .collect();
    DynamicValue::Numeric(NumericArray::row(NumericData::Float64(data)))
}
