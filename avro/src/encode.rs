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

use crate::{
    AvroResult,
    error::Details,
    schema::{EnumSchema, FixedSchema, Names, RecordSchema, Schema, SchemaNode},
    types::Value,
    util::zig_i64,
};
use indexmap::IndexMap;
use log::error;
use std::io::Write;

/// Encode a `Value` into avro format.
///
/// The schema drives the encoding: a value is accepted by every schema type that has a natural
/// representation for it (see [`Value`]). Returns the number of bytes written.
pub fn encode<W: Write>(value: &Value, schema: &Schema, writer: &mut W) -> AvroResult<usize> {
    encode_internal(value, schema.root(), schema.names(), writer)
}

pub fn encode_to_vec(value: &Value, schema: &Schema) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(value, schema, &mut buffer)?;
    Ok(buffer)
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized, W: Write>(
    s: &B,
    mut writer: W,
) -> AvroResult<usize> {
    let bytes = s.as_ref();
    let written = encode_long(bytes.len() as i64, &mut writer)?;
    write_raw(bytes, writer)?;
    Ok(written + bytes.len())
}

pub(crate) fn encode_long<W: Write>(i: i64, writer: W) -> AvroResult<usize> {
    zig_i64(i, writer)
}

fn write_raw<W: Write>(bytes: &[u8], mut writer: W) -> AvroResult<usize> {
    writer.write_all(bytes).map_err(Details::WriteBytes)?;
    Ok(bytes.len())
}

pub(crate) fn encode_internal<W: Write>(
    value: &Value,
    schema: &SchemaNode,
    names: &Names,
    writer: &mut W,
) -> AvroResult<usize> {
    match (schema, value) {
        (SchemaNode::Null, Value::Null) => Ok(0),
        (SchemaNode::Boolean, Value::Boolean(b)) => write_raw(&[u8::from(*b)], writer),
        (SchemaNode::Int, Value::Long(i)) => {
            let i = i32::try_from(*i).map_err(|_| Details::IntOutOfRange(*i))?;
            encode_long(i.into(), writer)
        }
        (SchemaNode::Long, Value::Long(i)) => encode_long(*i, writer),
        (SchemaNode::Float, Value::Double(x)) => write_raw(&(*x as f32).to_le_bytes(), writer),
        (SchemaNode::Float, Value::Long(i)) => write_raw(&(*i as f32).to_le_bytes(), writer),
        (SchemaNode::Double, Value::Double(x)) => write_raw(&x.to_le_bytes(), writer),
        (SchemaNode::Double, Value::Long(i)) => write_raw(&(*i as f64).to_le_bytes(), writer),
        (SchemaNode::Bytes, Value::Bytes(bytes) | Value::Fixed(bytes)) => {
            encode_bytes(bytes, writer)
        }
        (SchemaNode::String, Value::String(s) | Value::Enum(s)) => encode_bytes(s, writer),
        (SchemaNode::Record(record), Value::Record(fields) | Value::Map(fields)) => {
            encode_record(record, fields, names, writer)
        }
        (SchemaNode::Array(inner), Value::Array(items)) => {
            let mut written = 0;
            if !items.is_empty() {
                written += encode_long(items.len() as i64, &mut *writer)?;
                for item in items {
                    written += encode_internal(item, &inner.items, names, &mut *writer)?;
                }
            }
            Ok(written + write_raw(&[0u8], writer)?)
        }
        (SchemaNode::Map(inner), Value::Map(items) | Value::Record(items)) => {
            let mut written = 0;
            if !items.is_empty() {
                written += encode_long(items.len() as i64, &mut *writer)?;
                for (key, value) in items {
                    written += encode_bytes(key, &mut *writer)?;
                    written += encode_internal(value, &inner.values, names, &mut *writer)?;
                }
            }
            Ok(written + write_raw(&[0u8], writer)?)
        }
        (
            SchemaNode::Fixed(FixedSchema { size, .. }),
            Value::Fixed(bytes) | Value::Bytes(bytes),
        ) => {
            if bytes.len() != *size {
                return Err(Details::CompareFixedSizes {
                    size: *size,
                    n: bytes.len(),
                }
                .into());
            }
            write_raw(bytes, writer)
        }
        (SchemaNode::Enum(EnumSchema { symbols, .. }), Value::Enum(s) | Value::String(s)) => {
            if let Some(index) = symbols.iter().position(|item| item == s) {
                encode_long(index as i64, writer)
            } else {
                error!("Invalid symbol string {:?}.", &s[..]);
                Err(Details::GetEnumSymbol(s.clone()).into())
            }
        }
        (SchemaNode::Union(union), value) => {
            let (index, variant) = union.choose_variant(value, names)?;
            let written = encode_long(index as i64, &mut *writer)?;
            Ok(written + encode_internal(value, variant, names, writer)?)
        }
        (SchemaNode::Ref { .. }, value) => {
            encode_internal(value, schema.resolve(names)?, names, writer)
        }
        (schema, value) => Err(Details::EncodeValueAsSchemaError {
            value_kind: value.kind(),
            schema_kind: schema.kind(),
        }
        .into()),
    }
}

fn encode_record<W: Write>(
    record: &RecordSchema,
    fields: &IndexMap<String, Value>,
    names: &Names,
    writer: &mut W,
) -> AvroResult<usize> {
    let mut written_bytes = 0;
    for field in &record.fields {
        let value = fields
            .get(&field.name)
            .ok_or_else(|| Details::GetField(field.name.clone()))?;
        written_bytes += encode_internal(value, &field.schema, names, writer)?;
    }
    Ok(written_bytes)
}
