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
    schema::{EnumSchema, FixedSchema, Names, Schema, SchemaNode},
    types::Value,
    util::{safe_len, zag_i32, zag_i64},
};
use indexmap::IndexMap;
use std::io::Read;

/// Upper bound on the number of items reserved up front for one block. The count comes off the
/// wire, so anything beyond this grows as items are actually decoded.
const MAX_PREALLOCATED_ITEMS: usize = 1024;

/// The outcome of reading from a stream where running out of input is a normal signal rather
/// than a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// A complete item was read.
    Value(T),
    /// The stream ended cleanly before the first byte of the item.
    EndOfStream,
}

impl<T> Decoded<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::EndOfStream => None,
        }
    }
}

/// Decode a `Value` encoded in Avro format given its `Schema` and anything implementing
/// `io::Read` to read from.
pub fn decode<R: Read>(schema: &Schema, reader: &mut R) -> AvroResult<Value> {
    decode_internal(schema.root(), schema.names(), reader)
}

fn decode_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let len = zag_i64(reader)?;
    safe_len(usize::try_from(len).map_err(|e| Details::ConvertI64ToUsize(e, len))?)
}

/// Decode the length of a sequence.
///
/// Maps and arrays are 0-terminated, 0i64 is also encoded as 0 in Avro reading a length of 0
/// means the end of the map or array. A negative length is followed by the size of the block
/// in bytes, which is skipped.
fn decode_seq_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let raw_len = zag_i64(reader)?;
    let len = if raw_len < 0 {
        let _size = zag_i64(reader)?;
        raw_len.checked_neg().ok_or(Details::IntegerOverflow)?
    } else {
        raw_len
    };
    safe_len(usize::try_from(len).map_err(|e| Details::ConvertI64ToUsize(e, len))?)
}

fn decode_string<R: Read>(reader: &mut R) -> AvroResult<String> {
    let len = decode_len(reader)?;
    let bytes = read_bytes(reader, len).map_err(Details::ReadString)?;
    Ok(String::from_utf8(bytes).map_err(Details::ConvertToUtf8)?)
}

fn read_bytes<R: Read>(reader: &mut R, len: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

pub(crate) fn decode_internal<R: Read>(
    schema: &SchemaNode,
    names: &Names,
    reader: &mut R,
) -> AvroResult<Value> {
    match schema {
        SchemaNode::Null => Ok(Value::Null),
        SchemaNode::Boolean => {
            let mut buf = [0u8; 1];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadBoolean)?;
            Ok(Value::Boolean(buf[0] != 0))
        }
        SchemaNode::Int => Ok(Value::Long(zag_i32(reader)?.into())),
        SchemaNode::Long => Ok(Value::Long(zag_i64(reader)?)),
        SchemaNode::Float => {
            let mut buf = [0u8; std::mem::size_of::<f32>()];
            reader.read_exact(&mut buf[..]).map_err(Details::ReadFloat)?;
            Ok(Value::Double(f32::from_le_bytes(buf).into()))
        }
        SchemaNode::Double => {
            let mut buf = [0u8; std::mem::size_of::<f64>()];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadDouble)?;
            Ok(Value::Double(f64::from_le_bytes(buf)))
        }
        SchemaNode::Bytes => {
            let len = decode_len(reader)?;
            let bytes = read_bytes(reader, len).map_err(Details::ReadBytes)?;
            Ok(Value::Bytes(bytes))
        }
        SchemaNode::String => Ok(Value::String(decode_string(reader)?)),
        SchemaNode::Fixed(FixedSchema { size, .. }) => {
            let bytes =
                read_bytes(reader, safe_len(*size)?).map_err(|e| Details::ReadFixed(e, *size))?;
            Ok(Value::Fixed(bytes))
        }
        SchemaNode::Array(inner) => {
            let mut items = Vec::new();

            loop {
                let len = decode_seq_len(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(len.min(MAX_PREALLOCATED_ITEMS));
                for _ in 0..len {
                    items.push(decode_internal(&inner.items, names, reader)?);
                }
            }

            Ok(Value::Array(items))
        }
        SchemaNode::Map(inner) => {
            let mut items = IndexMap::new();

            loop {
                let len = decode_seq_len(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(len.min(MAX_PREALLOCATED_ITEMS));
                for _ in 0..len {
                    let key = decode_string(reader)?;
                    let value = decode_internal(&inner.values, names, reader)?;
                    items.insert(key, value);
                }
            }

            Ok(Value::Map(items))
        }
        SchemaNode::Record(record) => {
            let mut fields = IndexMap::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = decode_internal(&field.schema, names, reader)?;
                fields.insert(field.name.clone(), value);
            }
            Ok(Value::Record(fields))
        }
        SchemaNode::Enum(EnumSchema { symbols, .. }) => {
            let index = zag_i64(reader)?;
            let symbol = usize::try_from(index)
                .ok()
                .and_then(|i| symbols.get(i))
                .ok_or(Details::GetEnumValue {
                    index,
                    nsymbols: symbols.len(),
                })?;
            Ok(Value::Enum(symbol.clone()))
        }
        SchemaNode::Union(union) => {
            let index = zag_i64(reader)?;
            let variants = union.variants();
            let variant = usize::try_from(index)
                .ok()
                .and_then(|i| variants.get(i))
                .ok_or(Details::GetUnionVariant {
                    index,
                    num_variants: variants.len(),
                })?;
            decode_internal(variant, names, reader)
        }
        SchemaNode::Ref { .. } => decode_internal(schema.resolve(names)?, names, reader),
    }
}
