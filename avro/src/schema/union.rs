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
    schema::{Names, SchemaKind, SchemaNode},
    types::Value,
};

/// A description of a Union schema
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    /// The schemas that make up this union
    pub(crate) variants: Vec<SchemaNode>,
}

/// The broad shape of a value, as far as branch selection is concerned.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ValueClass {
    Mapping,
    Integer,
    Text,
    Real,
    Sequence,
    Binary,
    Boolean,
}

impl From<&Value> for ValueClass {
    fn from(value: &Value) -> Self {
        match value {
            Value::Record(_) | Value::Map(_) => ValueClass::Mapping,
            Value::Long(_) => ValueClass::Integer,
            Value::String(_) | Value::Enum(_) => ValueClass::Text,
            Value::Double(_) => ValueClass::Real,
            Value::Array(_) => ValueClass::Sequence,
            Value::Bytes(_) | Value::Fixed(_) => ValueClass::Binary,
            // `Null` is handled before classification
            Value::Boolean(_) | Value::Null => ValueClass::Boolean,
        }
    }
}

/// The order in which branch kinds are tried for each class of value. The first entry that
/// matches a branch decides.
const BRANCH_PRIORITY: [(ValueClass, SchemaKind); 12] = [
    (ValueClass::Mapping, SchemaKind::Record),
    (ValueClass::Integer, SchemaKind::Int),
    (ValueClass::Integer, SchemaKind::Long),
    (ValueClass::Text, SchemaKind::String),
    (ValueClass::Real, SchemaKind::Float),
    (ValueClass::Real, SchemaKind::Double),
    (ValueClass::Mapping, SchemaKind::Map),
    (ValueClass::Sequence, SchemaKind::Array),
    (ValueClass::Text, SchemaKind::Enum),
    (ValueClass::Binary, SchemaKind::Bytes),
    (ValueClass::Binary, SchemaKind::Fixed),
    (ValueClass::Boolean, SchemaKind::Boolean),
];

impl UnionSchema {
    /// Creates a new UnionSchema from a vector of schemas.
    pub fn new(variants: Vec<SchemaNode>) -> Self {
        UnionSchema { variants }
    }

    /// Returns a slice to all variants of this schema.
    pub fn variants(&self) -> &[SchemaNode] {
        &self.variants
    }

    /// Returns true if the any of the variants of this `UnionSchema` is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.variants.iter().any(|x| matches!(x, SchemaNode::Null))
    }

    /// Pick the branch `value` is encoded with, together with its position within this union.
    ///
    /// `Null` goes to the first `null` branch. Any other value is matched by its general shape
    /// against the kinds of the branches (references are followed through `names`), trying
    /// kinds in a fixed order: a map value prefers a `record` branch over a `map` branch, an
    /// integer prefers `int` over `long`, a string prefers `string` over `enum`, a float prefers
    /// `float` over `double` and binary data prefers `bytes` over `fixed`. Among branches of the
    /// same kind the first declared one wins, so two record branches can not be told apart.
    pub fn choose_variant<'a>(
        &'a self,
        value: &Value,
        names: &'a Names,
    ) -> AvroResult<(usize, &'a SchemaNode)> {
        if let Value::Null = value {
            return self
                .variants
                .iter()
                .position(|variant| matches!(variant, SchemaNode::Null))
                .map(|i| (i, &self.variants[i]))
                .ok_or_else(|| Details::AmbiguousUnionValue(value.kind()).into());
        }

        let kinds = self
            .variants
            .iter()
            .map(|variant| variant.resolve(names).map(SchemaNode::kind))
            .collect::<AvroResult<Vec<_>>>()?;

        let class = ValueClass::from(value);
        BRANCH_PRIORITY
            .iter()
            .filter(|(value_class, _)| *value_class == class)
            .find_map(|(_, wanted)| kinds.iter().position(|kind| kind == wanted))
            .map(|i| (i, &self.variants[i]))
            .ok_or_else(|| Details::AmbiguousUnionValue(value.kind()).into())
    }
}
