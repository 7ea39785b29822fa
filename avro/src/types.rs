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

//! Logic handling the intermediate representation of Avro values.
use indexmap::IndexMap;
use std::{collections::HashMap, fmt};
use strum_macros::EnumDiscriminants;

/// Represents any valid Avro value.
///
/// Values carry no schema. The schema they are encoded with decides their wire form, so the same
/// `Value` can be written as several Avro types (a [`Value::Long`] is valid for `int`, `long`,
/// `float` and `double`).
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash, Ord, PartialOrd))]
pub enum Value {
    /// A `null` Avro value.
    Null,
    /// A `boolean` Avro value.
    Boolean(bool),
    /// An integer. Used for both `int` and `long` Avro values.
    Long(i64),
    /// A floating point number. Used for both `float` and `double` Avro values.
    Double(f64),
    /// A `bytes` Avro value.
    Bytes(Vec<u8>),
    /// A `string` Avro value.
    String(String),
    /// A `fixed` Avro value.
    Fixed(Vec<u8>),
    /// An `enum` Avro value, holding the symbol.
    Enum(String),
    /// An `array` Avro value.
    Array(Vec<Value>),
    /// A `map` Avro value.
    Map(IndexMap<String, Value>),
    /// A `record` Avro value, keyed by field name in field order.
    Record(IndexMap<String, Value>),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Long => "long",
            ValueKind::Double => "double",
            ValueKind::Bytes => "bytes",
            ValueKind::String => "string",
            ValueKind::Fixed => "fixed",
            ValueKind::Enum => "enum",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Record => "record",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Build a [`Value::Record`] from `(field name, value)` pairs, keeping their order.
    pub fn record<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a [`Value::Map`] from `(key, value)` pairs, keeping their order.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn kind(&self) -> ValueKind {
        ValueKind::from(self)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Long(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Double(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T> From<IndexMap<String, T>> for Value
where
    T: Into<Self>,
{
    fn from(value: IndexMap<String, T>) -> Self {
        Self::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T> From<HashMap<String, T>> for Value
where
    T: Into<Self>,
{
    fn from(value: HashMap<String, T>) -> Self {
        Self::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(()), Value::Null);
        assert_eq!(Value::from(7i32), Value::Long(7));
        assert_eq!(Value::from(1.5f32), Value::Double(1.5));
        assert_eq!(Value::from("a"), Value::String("a".into()));
        assert_eq!(Value::from(&b"ab"[..]), Value::Bytes(vec![b'a', b'b']));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Long(3));
    }

    #[test]
    fn record_keeps_field_order() {
        let record = Value::record([("b", 1i64), ("a", 2i64)]);
        let Value::Record(fields) = record else {
            panic!("expected a record");
        };
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn kind_display() {
        assert_eq!(Value::Map(IndexMap::new()).kind(), ValueKind::Map);
        assert_eq!(ValueKind::Fixed.to_string(), "fixed");
        assert_eq!(Value::Null.kind().to_string(), "null");
    }
}
