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
    schema::{
        ArraySchema, EnumSchema, FixedSchema, MapSchema, Names, RecordField, RecordSchema,
        SchemaNode, UnionSchema,
    },
    util::MapHelper,
};
use log::warn;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Builds a [`SchemaNode`] tree out of JSON in a single pre-order walk, registering every named
/// type it meets on the way.
#[derive(Default)]
pub(crate) struct Parser {
    names: Names,
    /// Names are claimed when first met, before their children are parsed, so the outermost
    /// definition wins even though it is inserted into `names` last.
    claimed: HashSet<String>,
}

impl Parser {
    pub(super) fn into_names(self) -> Names {
        self.names
    }

    /// Create a `SchemaNode` from a `serde_json::Value` representing a JSON Avro schema.
    pub(super) fn parse(&mut self, value: &Value) -> AvroResult<SchemaNode> {
        match value {
            Value::String(t) => Ok(parse_known_schema(t)),
            Value::Object(data) => self.parse_complex(data),
            Value::Array(data) => self.parse_union(data),
            other => Err(Details::InvalidType(other.clone()).into()),
        }
    }

    /// Parse a `serde_json::Value` representing a complex Avro type, registering it if it is
    /// named.
    fn parse_complex(&mut self, data: &Map<String, Value>) -> AvroResult<SchemaNode> {
        let schema_type = data.get("type").ok_or(Details::GetComplexTypeField)?;

        let claimed = data.name().and_then(|name| self.claim(name));

        let node = match schema_type {
            Value::String(t) => match t.as_str() {
                "record" => self.parse_record(data)?,
                "enum" => parse_enum(data)?,
                "array" => self.parse_array(data)?,
                "map" => self.parse_map(data)?,
                "fixed" => parse_fixed(data)?,
                other => primitive(other).unwrap_or_else(|| SchemaNode::Ref {
                    name: other.to_string(),
                    type_tag: true,
                }),
            },
            Value::Object(data) => self.parse_complex(data)?,
            Value::Array(variants) => self.parse_union(variants)?,
            other => return Err(Details::InvalidType(other.clone()).into()),
        };

        if let Some(name) = claimed {
            self.names.insert(name, node.clone());
        }
        Ok(node)
    }

    /// Reserve `name` for the definition being parsed. Returns `None` if an earlier definition
    /// already took it.
    fn claim(&mut self, name: String) -> Option<String> {
        let key = name.trim_start_matches('.').to_string();
        if self.claimed.insert(key.clone()) {
            Some(key)
        } else {
            warn!("Ignoring duplicate definition of named type '{key}'");
            None
        }
    }

    fn parse_record(&mut self, data: &Map<String, Value>) -> AvroResult<SchemaNode> {
        let fields_json = data
            .get("fields")
            .and_then(|fields| fields.as_array())
            .ok_or(Details::GetRecordFieldsJson)?;

        let mut fields = Vec::with_capacity(fields_json.len());
        for field in fields_json {
            let (name, schema) = field
                .as_object()
                .and_then(|f| Some((f.name()?, f.get("type")?)))
                .ok_or_else(|| Details::GetRecordField(field.clone()))?;
            fields.push(RecordField {
                name,
                schema: self.parse(schema)?,
            });
        }

        Ok(SchemaNode::Record(RecordSchema {
            name: data.name(),
            fields,
        }))
    }

    fn parse_array(&mut self, data: &Map<String, Value>) -> AvroResult<SchemaNode> {
        let items = data.get("items").ok_or(Details::GetArrayItemsField)?;
        Ok(SchemaNode::Array(ArraySchema {
            items: Box::new(self.parse(items)?),
        }))
    }

    fn parse_map(&mut self, data: &Map<String, Value>) -> AvroResult<SchemaNode> {
        let values = data.get("values").ok_or(Details::GetMapValuesField)?;
        Ok(SchemaNode::Map(MapSchema {
            values: Box::new(self.parse(values)?),
        }))
    }

    fn parse_union(&mut self, items: &[Value]) -> AvroResult<SchemaNode> {
        let variants = items
            .iter()
            .map(|item| self.parse(item))
            .collect::<AvroResult<Vec<_>>>()?;
        Ok(SchemaNode::Union(UnionSchema::new(variants)))
    }
}

fn parse_enum(data: &Map<String, Value>) -> AvroResult<SchemaNode> {
    let symbols = data
        .get("symbols")
        .ok_or(Details::GetEnumSymbolsField)?
        .as_array()
        .and_then(|symbols| {
            symbols
                .iter()
                .map(|symbol| symbol.as_str().map(ToString::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(Details::GetEnumSymbols)?;

    Ok(SchemaNode::Enum(EnumSchema {
        name: data.name(),
        symbols,
    }))
}

fn parse_fixed(data: &Map<String, Value>) -> AvroResult<SchemaNode> {
    let size = data
        .get("size")
        .and_then(Value::as_u64)
        .and_then(|size| usize::try_from(size).ok())
        .ok_or(Details::GetFixedSizeField)?;

    Ok(SchemaNode::Fixed(FixedSchema {
        name: data.name(),
        size,
    }))
}

/// Parse a string as a primitive type or a reference to a named type.
fn parse_known_schema(name: &str) -> SchemaNode {
    primitive(name).unwrap_or_else(|| SchemaNode::reference(name))
}

fn primitive(name: &str) -> Option<SchemaNode> {
    Some(match name {
        "null" => SchemaNode::Null,
        "boolean" => SchemaNode::Boolean,
        "int" => SchemaNode::Int,
        "long" => SchemaNode::Long,
        "float" => SchemaNode::Float,
        "double" => SchemaNode::Double,
        "bytes" => SchemaNode::Bytes,
        "string" => SchemaNode::String,
        _ => return None,
    })
}
