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

//! Logic for parsing and interacting with schemas in Avro format.

mod parser;
mod union;

pub use crate::schema::union::UnionSchema;
use crate::{AvroResult, error::Details, schema::parser::Parser};
use serde_json::Value as JsonValue;
use std::{collections::HashMap, fmt};
use strum_macros::EnumDiscriminants;

/// Registry of named types, keyed by name without leading dots.
pub type Names = HashMap<String, SchemaNode>;

/// One node of a parsed Avro schema.
///
/// Named types may refer to each other (and to themselves) through [`SchemaNode::Ref`], which is
/// resolved against the [`Names`] registry of the owning [`Schema`] when it is reached.
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(SchemaKind), derive(Hash, Ord, PartialOrd))]
pub enum SchemaNode {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    Bytes,
    /// A `string` Avro schema.
    String,
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `array` Avro schema.
    ///
    /// All items will have the same schema.
    Array(ArraySchema),
    /// A `map` Avro schema.
    ///
    /// Keys are always strings and all values will have the same schema.
    Map(MapSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A reference to a named type.
    ///
    /// `type_tag` is set when the name is the `type` of a JSON object rather than a bare string.
    /// An unknown name is then an invalid type tag instead of an unresolved reference.
    Ref { name: String, type_tag: bool },
}

impl SchemaNode {
    pub fn kind(&self) -> SchemaKind {
        SchemaKind::from(self)
    }

    /// A reference to `name` written as a bare string.
    pub fn reference(name: impl Into<String>) -> Self {
        SchemaNode::Ref {
            name: name.into(),
            type_tag: false,
        }
    }

    /// Follow a [`SchemaNode::Ref`], and any chain of aliases behind it, to the named type it
    /// points to. Any other node is returned as is.
    pub(crate) fn resolve<'a>(&'a self, names: &'a Names) -> AvroResult<&'a SchemaNode> {
        let mut node = self;
        let mut hops = 0;
        while let SchemaNode::Ref { name, type_tag } = node {
            // a chain longer than the registry revisits a name
            if hops > names.len() {
                return Err(Details::UnknownType(name.clone()).into());
            }
            hops += 1;
            node = match names.get(name.trim_start_matches('.')) {
                Some(next) => next,
                None if *type_tag => {
                    return Err(Details::InvalidType(JsonValue::String(name.clone())).into());
                }
                None => return Err(Details::UnknownType(name.clone()).into()),
            };
        }
        Ok(node)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Record => "record",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Enum => "enum",
            SchemaKind::Union => "union",
            SchemaKind::Ref => "ref",
        };
        f.write_str(name)
    }
}

/// A description of a Record schema.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    pub name: Option<String>,
    /// The fields, in the order they are encoded.
    pub fields: Vec<RecordField>,
}

/// Represents a `field` in a `record` Avro schema.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub schema: SchemaNode,
}

/// A description of an Array schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
}

/// A description of a Map schema.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSchema {
    pub values: Box<SchemaNode>,
}

/// A description of a Fixed schema.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedSchema {
    pub name: Option<String>,
    /// The number of bytes every value holds.
    pub size: usize,
}

/// A description of an Enum schema.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumSchema {
    pub name: Option<String>,
    /// The symbols, in the order of their encoded index.
    pub symbols: Vec<String>,
}

/// A parsed Avro schema.
///
/// Holds the JSON it was parsed from, the root node and the registry of the named types defined
/// anywhere in it. A `Schema` never changes after construction and is meant to be shared through
/// an [`Arc`](std::sync::Arc).
#[derive(Clone, Debug)]
pub struct Schema {
    json: JsonValue,
    root: SchemaNode,
    names: Names,
}

impl Schema {
    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro schema.
    ///
    /// Structural mistakes are reported here. References to named types are not checked until
    /// they are reached while encoding or decoding, so a type may refer to itself or to a type
    /// defined later in the document.
    pub fn new(json: JsonValue) -> AvroResult<Schema> {
        let mut parser = Parser::default();
        let root = parser.parse(&json)?;
        Ok(Schema {
            json,
            root,
            names: parser.into_names(),
        })
    }

    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Schema> {
        let json = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        Self::new(json)
    }

    /// Look up a named type, following aliases to the definition they name. Leading dots in
    /// `name` are ignored.
    pub fn resolve(&self, name: &str) -> AvroResult<&SchemaNode> {
        lookup(&self.names, name)?.resolve(&self.names)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    /// The JSON this schema was parsed from.
    pub fn json(&self) -> &JsonValue {
        &self.json
    }

    /// Compact JSON text of the original schema, as stored in container headers.
    pub fn canonical_json(&self) -> String {
        self.json.to_string()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.json == other.json
    }
}

fn lookup<'a>(names: &'a Names, name: &str) -> AvroResult<&'a SchemaNode> {
    names
        .get(name.trim_start_matches('.'))
        .ok_or_else(|| Details::UnknownType(name.to_string()).into())
}
