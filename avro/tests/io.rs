// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Round trips of single datums through the binary encoding.

use avrolight::{
    Schema, decode, encode_to_vec, from_avro_slice,
    error::{Details, ErrorClass},
    types::Value,
};
use avrolight_test_helper::TestResult;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::LazyLock;

const LISP_SCHEMA: &str = r#"
{
    "type": "record",
    "name": "Lisp",
    "fields": [
        {
            "name": "value",
            "type": [
                "null",
                "string",
                {
                    "type": "record",
                    "name": "Cons",
                    "fields": [
                        {"name": "car", "type": "Lisp"},
                        {"name": "cdr", "type": "Lisp"}
                    ]
                }
            ]
        }
    ]
}
"#;

static SCHEMAS_TO_VALIDATE: LazyLock<Vec<(&'static str, Value)>> = LazyLock::new(|| {
    vec![
        (r#""null""#, Value::Null),
        (r#""boolean""#, Value::Boolean(true)),
        (
            r#""string""#,
            Value::String("adsfasdf09809dsf-=adsf".to_string()),
        ),
        (r#""bytes""#, Value::Bytes(b"12345abcd".to_vec())),
        (r#""int""#, Value::Long(0)),
        (r#""int""#, Value::Long(1234)),
        (r#""long""#, Value::Long(1234)),
        (r#""float""#, Value::Double(1234.0)),
        (r#""double""#, Value::Double(1234.0)),
        (
            r#"{"type": "fixed", "name": "Test", "size": 1}"#,
            Value::Fixed(b"B".to_vec()),
        ),
        (
            r#"{"type": "enum", "name": "Test", "symbols": ["A", "B"]}"#,
            Value::Enum("B".to_string()),
        ),
        (
            r#"{"type": "array", "items": "long"}"#,
            Value::Array(vec![Value::Long(1), Value::Long(3), Value::Long(2)]),
        ),
        (
            r#"{"type": "map", "values": "long"}"#,
            Value::map([("a", 1i64), ("b", 3i64), ("c", 2i64)]),
        ),
        (r#"["string", "null", "long"]"#, Value::Null),
        (
            r#"{"type": "record", "name": "Test", "fields": [{"name": "f", "type": "long"}]}"#,
            Value::record([("f", 5i64)]),
        ),
        (
            LISP_SCHEMA,
            Value::record([(
                "value",
                Value::record([
                    ("car", Value::record([("value", Value::from("head"))])),
                    ("cdr", Value::record([("value", Value::Null)])),
                ]),
            )]),
        ),
    ]
});

#[test]
fn test_round_trip() -> TestResult {
    for (raw_schema, value) in SCHEMAS_TO_VALIDATE.iter() {
        let schema = Schema::parse_str(raw_schema)?;
        let encoded = encode_to_vec(value, &schema)?;
        let decoded = decode(&schema, &mut encoded.as_slice())?;
        assert_eq!(
            value, &decoded,
            "round trip failed for schema {raw_schema}"
        );
    }
    Ok(())
}

#[rstest]
#[case(0, &[0x00])]
#[case(-1, &[0x01])]
#[case(1, &[0x02])]
#[case(-64, &[0x7f])]
#[case(64, &[0x80, 0x01])]
#[case(i64::MAX, &[0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01])]
#[case(i64::MIN, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01])]
fn test_long_encoding(#[case] n: i64, #[case] expected: &[u8]) -> TestResult {
    let schema = Schema::parse_str(r#""long""#)?;
    assert_eq!(encode_to_vec(&Value::Long(n), &schema)?, expected);
    assert_eq!(from_avro_slice(&schema, expected)?, (Value::Long(n), expected.len()));
    Ok(())
}

#[test]
fn test_lisp_list_bytes() -> TestResult {
    let schema = Schema::parse_str(LISP_SCHEMA)?;
    let value = Value::record([(
        "value",
        Value::record([
            ("car", Value::record([("value", Value::from("a"))])),
            ("cdr", Value::record([("value", Value::Null)])),
        ]),
    )]);
    // Cons branch, car: string branch "a", cdr: null branch
    assert_eq!(encode_to_vec(&value, &schema)?, vec![4, 2, 2, b'a', 0]);
    Ok(())
}

#[test]
fn test_empty_collections_are_one_byte() -> TestResult {
    let array = Schema::parse_str(r#"{"type": "array", "items": "string"}"#)?;
    assert_eq!(encode_to_vec(&Value::Array(vec![]), &array)?, vec![0]);

    let map = Schema::parse_str(r#"{"type": "map", "values": "string"}"#)?;
    let empty = Value::Map(Default::default());
    assert_eq!(encode_to_vec(&empty, &map)?, vec![0]);
    assert_eq!(decode(&map, &mut &[0u8][..])?, empty);
    Ok(())
}

#[test]
fn test_null_goes_to_first_null_branch() -> TestResult {
    let schema = Schema::parse_str(r#"["long", "null", "string", "null"]"#)?;
    assert_eq!(encode_to_vec(&Value::Null, &schema)?, vec![2]);
    Ok(())
}

#[rstest]
#[case(r#"["long", "int"]"#, Value::Long(1), 1)]
#[case(r#"["double", "float"]"#, Value::Double(1.5), 1)]
#[case(r#"[{"type": "enum", "name": "E", "symbols": ["x"]}, "string"]"#, Value::from("x"), 1)]
#[case(r#"[{"type": "enum", "name": "E", "symbols": ["x"]}, "string"]"#, Value::Enum("x".into()), 1)]
#[case(r#"[{"type": "map", "values": "long"}, {"type": "record", "name": "R", "fields": []}]"#, Value::map([("a", 1i64)]), 1)]
#[case(r#"[{"type": "fixed", "name": "F", "size": 1}, "bytes"]"#, Value::Fixed(vec![1]), 1)]
#[case(r#"["bytes", {"type": "fixed", "name": "F", "size": 1}]"#, Value::Bytes(vec![1]), 0)]
#[case(r#"["int", "boolean"]"#, Value::Boolean(true), 1)]
#[case(r#"["null", {"type": "array", "items": "long"}]"#, Value::Array(vec![]), 1)]
fn test_union_branch_priority(
    #[case] raw_schema: &str,
    #[case] value: Value,
    #[case] expected_branch: u8,
) -> TestResult {
    let schema = Schema::parse_str(raw_schema)?;
    let encoded = encode_to_vec(&value, &schema)?;
    assert_eq!(encoded[0], expected_branch * 2);
    Ok(())
}

#[test]
fn test_integer_does_not_fall_back_to_real() -> TestResult {
    let schema = Schema::parse_str(r#"["string", "double"]"#)?;
    let err = encode_to_vec(&Value::Long(1), &schema).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Encoding);
    assert!(matches!(err.into_details(), Details::AmbiguousUnionValue(_)));
    Ok(())
}

#[test]
fn test_int_branch_value_out_of_range() -> TestResult {
    // the int branch wins even when the value only fits in a long
    let schema = Schema::parse_str(r#"["long", "int"]"#)?;
    let err = encode_to_vec(&Value::Long(i64::MAX), &schema).unwrap_err();
    assert!(matches!(err.into_details(), Details::IntOutOfRange(i64::MAX)));
    Ok(())
}

#[test]
fn test_negative_block_count_in_array() -> TestResult {
    let schema = Schema::parse_str(r#"{"type": "array", "items": "long"}"#)?;
    // -2 items in 2 bytes, then 1 item, then the end
    let input: &[u8] = &[3, 4, 2, 4, 2, 6, 0];
    let (value, consumed) = from_avro_slice(&schema, input)?;
    assert_eq!(
        value,
        Value::Array(vec![Value::Long(1), Value::Long(2), Value::Long(3)])
    );
    assert_eq!(consumed, input.len());
    Ok(())
}

#[test]
fn test_from_avro_slice_leaves_trailing_bytes() -> TestResult {
    let schema = Schema::parse_str(r#""string""#)?;
    let input: &[u8] = &[4, b'h', b'i', 0xde, 0xad];
    let (value, consumed) = from_avro_slice(&schema, input)?;
    assert_eq!(value, Value::from("hi"));
    assert_eq!(consumed, 3);
    Ok(())
}

#[test]
fn test_unresolved_reference_fails_when_reached() -> TestResult {
    let schema = Schema::parse_str(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "ok", "type": "long"},
            {"name": "later", "type": ["null", "Missing"]}
        ]}"#,
    )?;

    // the null branch is found without resolving anything else
    let value = Value::record([("ok", Value::Long(1)), ("later", Value::Null)]);
    let encoded = encode_to_vec(&value, &schema)?;
    assert_eq!(decode(&schema, &mut encoded.as_slice())?, value);

    let value = Value::record([("ok", Value::Long(1)), ("later", Value::Long(2))]);
    let err = encode_to_vec(&value, &schema).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Schema);
    assert!(matches!(err.into_details(), Details::UnknownType(name) if name == "Missing"));

    let err = decode(&schema, &mut &[2u8, 2][..]).unwrap_err();
    assert!(matches!(err.into_details(), Details::UnknownType(_)));
    Ok(())
}

#[test]
fn test_schema_is_shareable() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<Schema>();
    assert_send_sync::<std::sync::Arc<Schema>>();
}
