//! Encoder: `DynamicValue` to BSON document
//!
//! Emission rules:
//! - Values that are not flat are folded into nested row cells first
//! - Numeric, logical and date arrays become `null` (no elements), a bare
//!   scalar (one element) or an array
//! - 8-bit integer arrays become a single generic binary blob
//! - Text becomes a string, cells become arrays
//! - A single record becomes a sub-document, several records an array of
//!   sub-documents
//!
//! The root value is written inline: sequences become positional keys, a
//! single element is stored under `"0"` and a single record contributes its
//! own fields.

use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document};
use tracing::trace;

use super::fold::fold;
use super::keys::{OBJECT_ID_FIELD, OBJECT_ID_KEY};
use crate::config::CodecConfig;
use crate::document::Fragment;
use crate::error::{CodecError, Result};
use crate::value::{
    check_shape, date, CellArray, DateArray, DynamicValue, LogicalArray, NumericArray,
    NumericData, RecordArray, TextArray,
};

/// Converts dynamic values into BSON documents
#[derive(Debug, Clone)]
pub struct Encoder {
    max_depth: usize,
}

impl Encoder {
    /// Create an encoder honoring the limits in `config`
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    /// Encode `value` into a root document
    ///
    /// # Arguments
    /// * `value` - Value to encode
    ///
    /// # Returns
    /// * `Result<Document>` - The root document; any failure aborts the
    ///   whole encode
    pub fn encode(&self, value: &DynamicValue) -> Result<Document> {
        Ok(self.emit(value, 0, true)?.into_root())
    }

    fn emit(&self, value: &DynamicValue, depth: usize, root: bool) -> Result<Fragment> {
        let dims = value
            .dims()
            .ok_or_else(|| CodecError::UnsupportedType(value.class_name().to_string()))?;
        if depth > self.max_depth || dims.rank() > self.max_depth {
            return Err(CodecError::ConversionFailure(format!(
                "{} value nests deeper than {} levels",
                value.class_name(),
                self.max_depth
            ))
            .into());
        }
        trace!(class = value.class_name(), %dims, depth, "emitting value");

        let folded = fold(value)?;
        match folded.as_ref() {
            DynamicValue::Numeric(array) => numeric(array),
            DynamicValue::Logical(array) => logical(array),
            DynamicValue::Date(array) => dates(array),
            DynamicValue::Text(array) => text(array),
            DynamicValue::Cell(array) => self.cell(array, depth),
            DynamicValue::Record(array) => self.record(array, depth, root),
            DynamicValue::Opaque(opaque) => {
                Err(CodecError::UnsupportedType(opaque.class_name.clone()).into())
            }
        }
    }

    fn cell(&self, array: &CellArray, depth: usize) -> Result<Fragment> {
        check_shape(&array.dims, array.elements.len())?;
        let items = array
            .elements
            .iter()
            .map(|element| -> Result<Bson> {
                Ok(self.emit(element, depth + 1, false)?.into_bson())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Fragment::Sequence(items))
    }

    fn record(&self, array: &RecordArray, depth: usize, root: bool) -> Result<Fragment> {
        check_shape(&array.dims, array.records.len())?;
        match array.records.as_slice() {
            [values] => Ok(Fragment::Fields(self.record_document(
                &array.fields,
                values,
                depth,
                root,
            )?)),
            records => {
                let items = records
                    .iter()
                    .map(|values| -> Result<Bson> {
                        Ok(Bson::Document(self.record_document(
                            &array.fields,
                            values,
                            depth + 1,
                            false,
                        )?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Fragment::Sequence(items))
            }
        }
    }

    /// Document for one record element; the root record's `id_` field maps
    /// back to an object id under `_id`
    fn record_document(
        &self,
        fields: &[String],
        values: &[DynamicValue],
        depth: usize,
        root: bool,
    ) -> Result<Document> {
        if fields.len() != values.len() {
            return Err(CodecError::ConversionFailure(format!(
                "record holds {} values for {} fields",
                values.len(),
                fields.len()
            ))
            .into());
        }

        let mut doc = Document::new();
        for (field, value) in fields.iter().zip(values) {
            if root && field == OBJECT_ID_FIELD {
                if let Some(oid) = object_id(value) {
                    doc.insert(OBJECT_ID_KEY, oid);
                    continue;
                }
            }
            doc.insert(field.as_str(), self.emit(value, depth + 1, false)?.into_bson());
        }
        Ok(doc)
    }
}

/// Object id carried as 12 raw bytes of text
fn object_id(value: &DynamicValue) -> Option<ObjectId> {
    match value {
        DynamicValue::Text(text) => {
            let bytes: [u8; 12] = text.data.as_slice().try_into().ok()?;
            Some(ObjectId::from_bytes(bytes))
        }
        _ => None,
    }
}

/// Null, a bare scalar or an array, by element count
fn scalars(mut items: Vec<Bson>) -> Fragment {
    match items.len() {
        0 => Fragment::Single(Bson::Null),
        1 => Fragment::Single(items.remove(0)),
        _ => Fragment::Sequence(items),
    }
}

fn blob(bytes: Vec<u8>) -> Fragment {
    if bytes.is_empty() {
        Fragment::Single(Bson::Null)
    } else {
        Fragment::Single(Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        }))
    }
}

fn numeric(array: &NumericArray) -> Result<Fragment> {
    check_shape(&array.dims, array.data.len())?;
    let items: Vec<Bson> = match &array.data {
        NumericData::Int8(values) => {
            return Ok(blob(values.iter().map(|&v| v as u8).collect()));
        }
        NumericData::UInt8(values) => return Ok(blob(values.clone())),
        NumericData::Int16(values) => values.iter().map(|&v| Bson::Int32(v.into())).collect(),
        NumericData::UInt16(values) => values.iter().map(|&v| Bson::Int32(v.into())).collect(),
        NumericData::Int32(values) => values.iter().map(|&v| Bson::Int32(v)).collect(),
        NumericData::UInt32(values) => values
            .iter()
            .map(|&v| i32::try_from(v).map_or(Bson::Int64(v.into()), Bson::Int32))
            .collect(),
        NumericData::Int64(values) => values.iter().map(|&v| Bson::Int64(v)).collect(),
        NumericData::UInt64(values) => values
            .iter()
            .map(|&v| {
                i64::try_from(v).map(Bson::Int64).map_err(|_| {
                    CodecError::ConversionFailure(format!("uint64 value {v} exceeds the int64 range"))
                })
            })
            .collect::<std::result::Result<_, _>>()?,
        NumericData::Float32(values) => values.iter().map(|&v| Bson::Double(v.into())).collect(),
        NumericData::Float64(values) => values.iter().map(|&v| Bson::Double(v)).collect(),
    };
    Ok(scalars(items))
}

fn logical(array: &LogicalArray) -> Result<Fragment> {
    check_shape(&array.dims, array.data.len())?;
    Ok(scalars(array.data.iter().map(|&v| Bson::Boolean(v)).collect()))
}

fn dates(array: &DateArray) -> Result<Fragment> {
    check_shape(&array.dims, array.data.len())?;
    let items = array
        .data
        .iter()
        .map(|&days| {
            date::days_to_millis(days)
                .map(|millis| Bson::DateTime(bson::DateTime::from_millis(millis)))
                .ok_or_else(|| {
                    CodecError::ConversionFailure(format!("date number {days} is out of range"))
                })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(scalars(items))
}

fn text(array: &TextArray) -> Result<Fragment> {
    check_shape(&array.dims, array.data.len())?;
    let text = String::from_utf8(array.data.clone())
        .map_err(|e| CodecError::ConversionFailure(format!("text is not valid UTF-8: {e}")))?;
    Ok(Fragment::Single(Bson::String(text)))
}
