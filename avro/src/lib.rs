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

//! A light implementation of the **[Apache Avro](https://avro.apache.org/)** binary encoding
//! and object container files.
//!
//! Values are represented by the schema-less [`Value`](types::Value) type and encoded under the
//! direction of a [`Schema`] parsed from its JSON form. A value is accepted by every Avro type
//! with a natural representation for it, and unions pick their branch from the kind of the value.
//!
//! # Writing and reading a container
//!
//! ```
//! use avrolight::{Reader, Schema, Writer, types::Value};
//! # fn main() -> Result<(), avrolight::Error> {
//! let schema = Schema::parse_str(
//!     r#"{"type": "record", "name": "Test", "fields": [
//!         {"name": "a", "type": "long"},
//!         {"name": "b", "type": ["null", "string"]}
//!     ]}"#,
//! )?;
//!
//! let mut writer = Writer::new(schema, Vec::new())?;
//! writer.append_value(Value::record([("a", Value::from(27i64)), ("b", Value::from("foo"))]))?;
//! writer.append_value(Value::record([("a", Value::from(3i64)), ("b", Value::Null)]))?;
//! let encoded = writer.into_inner()?;
//!
//! for value in Reader::new(encoded.as_slice())? {
//!     println!("{:?}", value?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Single datums
//!
//! [`to_avro_datum`] and [`from_avro_slice`] encode and decode one value without any framing.
//!
//! ```
//! use avrolight::{Schema, from_avro_slice, to_avro_datum, types::Value};
//! # fn main() -> Result<(), avrolight::Error> {
//! let schema = Schema::parse_str(r#"{"type": "array", "items": "long"}"#)?;
//! let value = Value::Array(vec![1i64.into(), 3i64.into(), 2i64.into()]);
//! let encoded = to_avro_datum(&schema, value.clone())?;
//! assert_eq!(encoded, [6, 2, 6, 4, 0]);
//! assert_eq!(from_avro_slice(&schema, &encoded)?, (value, 5));
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//!
//! Only the `null` codec is supported. Union branches are chosen by the general kind of a value
//! (see [`UnionSchema::choose_variant`](schema::UnionSchema::choose_variant)), so a union of two
//! records always uses the first one. There is no schema resolution between a writer and a reader
//! schema.
//!
//! # MSRV
//!
//! The current MSRV is 1.88.0.
//!
//! The MSRV may be bumped in minor releases.

mod decode;
mod encode;
mod reader;
mod writer;

pub mod error;
pub mod headers;
pub mod schema;
pub mod types;
pub mod util;

pub use decode::{Decoded, decode};
pub use encode::{encode, encode_to_vec};
pub use error::Error;
pub use reader::{Reader, from_avro_datum, from_avro_slice};
pub use schema::Schema;
pub use writer::{DEFAULT_BLOCK_SIZE, Writer, WriterBuilder, to_avro_datum};

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;
