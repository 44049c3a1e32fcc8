//! End-to-end tests through BSON bytes

use super::*;
use crate::config::CodecConfig;
use crate::error::{CodecError, DynbsonError};
use crate::value::{
    CellArray, DateArray, Dims, DynamicValue, LogicalArray, NumericArray, NumericData,
    OpaqueValue, RecordArray, TextArray,
};
use crate::{decode_from_bytes, decode_from_bytes_with, encode_to_bytes, encode_to_bytes_with};
use bson::{doc, Document};

fn to_bytes(doc: &Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.to_writer(&mut bytes).unwrap();
    bytes
}

fn round_trip(value: &DynamicValue) -> DynamicValue {
    decode_from_bytes(&encode_to_bytes(value).unwrap()).unwrap()
}

fn numeric(dims: Vec<usize>, data: NumericData) -> DynamicValue {
    DynamicValue::Numeric(NumericArray::new(Dims::new(dims), data).unwrap())
}

// ===== Decoding =====

#[test]
fn test_positional_keys_decode_to_row() {
    let value = decode_from_bytes(&to_bytes(&doc! { "0": 1, "1": 2 })).unwrap();
    assert_eq!(value, numeric(vec![1, 2], NumericData::Float64(vec![1.0, 2.0])));
}

#[test]
fn test_mixed_keys_decode_to_record() {
    let value = decode_from_bytes(&to_bytes(&doc! { "0": 1, "x": 2 })).unwrap();
    match value {
        DynamicValue::Record(record) => {
            assert_eq!(record.dims, Dims::scalar());
            assert_eq!(record.fields, vec!["x0", "x"]);
        }
        other => panic!("expected struct, got {}", other.class_name()),
    }
}

#[test]
fn test_single_key_zero_is_one_element_array() {
    let value = decode_from_bytes(&to_bytes(&doc! { "0": 7 })).unwrap();
    assert_eq!(value, DynamicValue::scalar(7.0));
}

#[test]
fn test_unreadable_root_is_empty() {
    assert_eq!(decode_from_bytes(b"\x01\x02").unwrap(), DynamicValue::empty());
    assert_eq!(decode_from_bytes(&[]).unwrap(), DynamicValue::empty());
}

#[test]
fn test_decimal128_fails_whole_decode() {
    let doc = doc! { "outer": { "value": bson::Decimal128::from_bytes([0; 16]) } };
    assert!(matches!(
        decode_from_bytes(&to_bytes(&doc)),
        Err(DynbsonError::Codec(CodecError::MalformedDocument(_)))
    ));
}

// ===== Encoding =====

#[test]
fn test_cell_of_string_round_trip() {
    let value = DynamicValue::Cell(CellArray::row(vec![DynamicValue::text("hi")]));
    let bytes = encode_to_bytes(&value).unwrap();
    assert_eq!(Document::from_reader(bytes.as_slice()).unwrap(), doc! { "0": "hi" });
    assert_eq!(decode_from_bytes(&bytes).unwrap(), DynamicValue::text("hi"));
}

#[test]
fn test_object_id_field_end_to_end() {
    let raw: Vec<u8> = vec![0x5f, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e, 0x6f, 0x70, 0x81, 0x92, 0xa3, 0xb4];
    let record = DynamicValue::Record(RecordArray::single([
        (
            OBJECT_ID_FIELD,
            DynamicValue::Text(TextArray::new(Dims::row(12), raw.clone()).unwrap()),
        ),
        ("name", DynamicValue::text("abc")),
    ]));
    let bytes = encode_to_bytes(&record).unwrap();

    let doc = Document::from_reader(bytes.as_slice()).unwrap();
    assert!(doc.get_object_id(OBJECT_ID_KEY).is_ok());
    assert_eq!(doc.get_str("name").unwrap(), "abc");
    assert!(!doc.contains_key(OBJECT_ID_FIELD));

    match decode_from_bytes(&bytes).unwrap() {
        DynamicValue::Record(decoded) => {
            assert_eq!(decoded.fields[0], OBJECT_ID_FIELD);
            assert_eq!(
                decoded.get(0, OBJECT_ID_FIELD),
                Some(&DynamicValue::text("5f1a2b3c4d5e6f708192a3b4"))
            );
            assert_eq!(decoded.get(0, "name"), Some(&DynamicValue::text("abc")));
        }
        other => panic!("expected struct, got {}", other.class_name()),
    }
}

#[test]
fn test_opaque_fails_whole_encode() {
    let value = DynamicValue::Record(RecordArray::single([
        ("ok", DynamicValue::scalar(1.0)),
        (
            "handle",
            DynamicValue::Opaque(OpaqueValue {
                class_name: "function_handle".into(),
            }),
        ),
    ]));
    assert!(matches!(
        encode_to_bytes(&value),
        Err(DynbsonError::Codec(CodecError::UnsupportedType(_)))
    ));
}

#[test]
fn test_declared_shape_larger_than_storage() {
    let value = DynamicValue::Numeric(NumericArray {
        dims: Dims::new(vec![100_000, 100_000]),
        data: NumericData::Float64(vec![]),
    });
    assert!(matches!(
        encode_to_bytes(&value),
        Err(DynbsonError::Codec(CodecError::ConversionFailure(_)))
    ));
}

#[test]
fn test_depth_limit_both_ways() {
    let mut value = DynamicValue::scalar(1.0);
    for _ in 0..10 {
        value = DynamicValue::Record(RecordArray::single([("inner", value)]));
    }
    let shallow = CodecConfig { max_depth: 4 };
    assert!(matches!(
        encode_to_bytes_with(&value, &shallow),
        Err(DynbsonError::Codec(CodecError::ConversionFailure(_)))
    ));

    let bytes = encode_to_bytes(&value).unwrap();
    assert!(matches!(
        decode_from_bytes_with(&bytes, &shallow),
        Err(DynbsonError::Codec(CodecError::MalformedDocument(_)))
    ));
    assert_eq!(decode_from_bytes(&bytes).unwrap(), value);
}

// ===== Round trips =====

#[test]
fn test_three_dimensional_round_trip() {
    let value = numeric(vec![3, 4, 5], NumericData::Float64((0..60).map(f64::from).collect()));
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_int64_matrix_round_trip() {
    let value = numeric(vec![2, 3], NumericData::Int64(vec![1, 2, 3, 4, 5, 6]));
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_logical_matrix_round_trip() {
    let value = DynamicValue::Logical(
        LogicalArray::new(Dims::new(vec![2, 2]), vec![true, false, false, true]).unwrap(),
    );
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_uint8_matrix_round_trip() {
    let value = numeric(vec![2, 3], NumericData::UInt8(vec![1, 2, 3, 4, 5, 6]));
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_record_matrix_round_trip() {
    let records = (0..4)
        .map(|i| vec![DynamicValue::scalar(f64::from(i)), DynamicValue::text("x")])
        .collect();
    let value = DynamicValue::Record(
        RecordArray::new(Dims::new(vec![2, 2]), vec!["n".into(), "s".into()], records).unwrap(),
    );
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_date_row_round_trip() {
    let value = DynamicValue::Date(
        DateArray::new(Dims::row(3), vec![719_529.0, 719_529.5, 738_000.25]).unwrap(),
    );
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_nested_record_round_trip() {
    let value = DynamicValue::Record(RecordArray::single([
        ("name", DynamicValue::text("sensor")),
        ("readings", numeric(vec![1, 3], NumericData::Float64(vec![0.5, 1.5, 2.5]))),
        ("active", DynamicValue::Logical(LogicalArray::scalar(true))),
        ("tags", DynamicValue::Cell(CellArray::row(vec![
            DynamicValue::text("a"),
            DynamicValue::text("b"),
        ]))),
    ]));
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_lossy_conversions_documented() {
    // narrow integers widen to double
    let int16 = numeric(vec![1, 2], NumericData::Int16(vec![-1, 2]));
    assert_eq!(round_trip(&int16), numeric(vec![1, 2], NumericData::Float64(vec![-1.0, 2.0])));

    // signed bytes come back unsigned
    let int8 = numeric(vec![1, 2], NumericData::Int8(vec![-1, 2]));
    assert_eq!(round_trip(&int8), numeric(vec![1, 2], NumericData::UInt8(vec![255, 2])));

    // column vectors come back as rows
    let column = numeric(vec![3, 1], NumericData::Float64(vec![1.0, 2.0, 3.0]));
    assert_eq!(round_trip(&column), numeric(vec![1, 3], NumericData::Float64(vec![1.0, 2.0, 3.0])));
}

#[test]
fn test_rows_of_mixed_elements_decode_to_cell_matrix() {
    let value = decode_from_bytes(&to_bytes(&doc! { "0": ["a", 1.0], "1": ["b", 2.0] })).unwrap();
    assert_eq!(
        value,
        DynamicValue::Cell(
            CellArray::new(
                Dims::new(vec![2, 2]),
                vec![
                    DynamicValue::text("a"),
                    DynamicValue::text("b"),
                    DynamicValue::scalar(1.0),
                    DynamicValue::scalar(2.0),
                ],
            )
            .unwrap()
        )
    );
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_decode_then_merge_is_idempotent() {
    let value = decode_from_bytes(&to_bytes(&doc! { "0": [1, 2], "1": [3, 4] })).unwrap();
    assert_eq!(value, numeric(vec![2, 2], NumericData::Float64(vec![1.0, 3.0, 2.0, 4.0])));
    assert_eq!(try_merge(value.clone()), value);
}

// ===== Properties =====

mod properties {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    /// Shapes that survive a round trip: rows and matrices with at least
    /// two columns (columns come back as rows)
    fn shape() -> impl Strategy<Value = (usize, usize)> {
        (1usize..5, 2usize..6)
    }

    proptest! {
        #[test]
        fn double_matrices_round_trip(
            (rows, cols, data) in shape().prop_flat_map(|(r, c)| {
                (Just(r), Just(c), vec(-1.0e6f64..1.0e6, r * c))
            })
        ) {
            let value = numeric(vec![rows, cols], NumericData::Float64(data));
            prop_assert_eq!(round_trip(&value), value);
        }

        #[test]
        fn int64_matrices_round_trip(
            (rows, cols, data) in shape().prop_flat_map(|(r, c)| {
                (Just(r), Just(c), vec(any::<i64>(), r * c))
            })
        ) {
            let value = numeric(vec![rows, cols], NumericData::Int64(data));
            prop_assert_eq!(round_trip(&value), value);
        }

        #[test]
        fn logical_matrices_round_trip(
            (rows, cols, data) in shape().prop_flat_map(|(r, c)| {
                (Just(r), Just(c), vec(any::<bool>(), r * c))
            })
        ) {
            let value = DynamicValue::Logical(
                LogicalArray::new(Dims::new(vec![rows, cols]), data).unwrap(),
            );
            prop_assert_eq!(round_trip(&value), value);
        }
    }
}
