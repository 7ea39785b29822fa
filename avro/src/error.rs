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

use crate::{schema::SchemaKind, types::ValueKind};
use std::{error::Error as _, fmt};

/// Errors encountered while encoding, decoding or framing Avro data.
///
/// To inspect the details of the error use [`details`](Self::details) or
/// [`into_details`](Self::into_details) to get a [`Details`] which contains more precise error
/// information, or [`class`](Self::class) for the broad category of the failure.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// The category this error belongs to.
    pub fn class(&self) -> ErrorClass {
        self.details.class()
    }

    /// Whether this error means the container stream is not a valid or intact object container
    /// file (bad magic, missing schema, unsupported codec, sync marker mismatch).
    pub fn is_corruption(&self) -> bool {
        self.class() == ErrorClass::Container
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        let kind = match error.class() {
            ErrorClass::Io => match error.details() {
                Details::WriteBytes(e)
                | Details::FlushWriter(e)
                | Details::WriteMarker(e)
                | Details::SeekEnd(e) => e.kind(),
                _ => std::io::ErrorKind::Other,
            },
            _ => std::io::ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, error)
    }
}

/// Broad categories of [`Details`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The schema is malformed or references an unknown name.
    Schema,
    /// A value could not be encoded with the given schema.
    Encoding,
    /// The input could not be decoded with the given schema.
    Decoding,
    /// The stream is not an intact object container file.
    Container,
    /// The underlying stream failed.
    Io,
}

#[derive(thiserror::Error)]
pub enum Details {
    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("No `type` in complex type")]
    GetComplexTypeField,

    #[error("Invalid schema type: {0}")]
    InvalidType(serde_json::Value),

    #[error("No `fields` in record")]
    GetRecordFieldsJson,

    #[error("Record field is not an object with a string `name` and a `type`: {0}")]
    GetRecordField(serde_json::Value),

    #[error("No `symbols` field in enum")]
    GetEnumSymbolsField,

    #[error("Unable to parse `symbols` in enum")]
    GetEnumSymbols,

    #[error("Fixed schema has no non-negative integer `size`")]
    GetFixedSizeField,

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("Unresolved schema reference: '{0}'")]
    UnknownType(String),

    #[error("Can not encode a value of kind {value_kind} with schema {schema_kind}")]
    EncodeValueAsSchemaError {
        value_kind: ValueKind,
        schema_kind: SchemaKind,
    },

    #[error("Value {0} does not fit into an int")]
    IntOutOfRange(i64),

    #[error("Fixed size mismatch, expected: {size}, got: {n}")]
    CompareFixedSizes { size: usize, n: usize },

    #[error("Enum symbol not found {0}")]
    GetEnumSymbol(String),

    #[error("Could not find a matching union variant for a value of kind {0}")]
    AmbiguousUnionValue(ValueKind),

    #[error("Missing field in record: {0:?}")]
    GetField(String),

    #[error("Metadata keys starting with 'avro.' are reserved for internal usage: {0}.")]
    InvalidMetadataKey(String),

    #[error("Cannot add user metadata after the header was written")]
    FileHeaderAlreadyWritten,

    #[error("Failed to read variable length integer bytes: {0}")]
    ReadVariableIntegerBytes(#[source] std::io::Error),

    #[error("Integer overflow when decoding integer")]
    IntegerOverflow,

    #[error("Failed to convert decoded long {1} into an int")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Failed to read boolean bytes: {0}")]
    ReadBoolean(#[source] std::io::Error),

    #[error("Failed to read float: {0}")]
    ReadFloat(#[source] std::io::Error),

    #[error("Failed to read double: {0}")]
    ReadDouble(#[source] std::io::Error),

    #[error("Failed to read bytes: {0}")]
    ReadBytes(#[source] std::io::Error),

    #[error("Failed to read string: {0}")]
    ReadString(#[source] std::io::Error),

    #[error("Failed to read fixed number of bytes '{1}': {0}")]
    ReadFixed(#[source] std::io::Error, usize),

    #[error("Invalid utf-8 string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Cannot convert i64 to usize: {1}")]
    ConvertI64ToUsize(#[source] std::num::TryFromIntError, i64),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Union index {index} out of bounds: {num_variants}")]
    GetUnionVariant { index: i64, num_variants: usize },

    #[error("Enum symbol index out of bounds: {index} (number of symbols: {nsymbols})")]
    GetEnumValue { index: i64, nsymbols: usize },

    #[error("Wrong magic in header")]
    HeaderMagic,

    #[error("Header metadata is not a map of bytes")]
    GetHeaderMetadata,

    #[error("No `avro.schema` in header metadata")]
    GetAvroSchemaFromMap,

    #[error("Codec '{0}' is not supported")]
    CodecNotSupported(String),

    #[error("Failed to read marker bytes: {0}")]
    ReadMarker(#[source] std::io::Error),

    #[error("Failed to read block marker bytes: {0}")]
    ReadBlockMarker(#[source] std::io::Error),

    #[error("Block marker does not match header marker")]
    GetBlockMarker,

    #[error("Failed to write bytes: {0}")]
    WriteBytes(#[source] std::io::Error),

    #[error("Failed to flush inner writer during flush: {0}")]
    FlushWriter(#[source] std::io::Error),

    #[error("Failed to write marker: {0}")]
    WriteMarker(#[source] std::io::Error),

    #[error("Failed to seek to the end of the container: {0}")]
    SeekEnd(#[source] std::io::Error),
}

impl Details {
    /// The category this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            Details::ParseSchemaJson(_)
            | Details::GetComplexTypeField
            | Details::InvalidType(_)
            | Details::GetRecordFieldsJson
            | Details::GetRecordField(_)
            | Details::GetEnumSymbolsField
            | Details::GetEnumSymbols
            | Details::GetFixedSizeField
            | Details::GetArrayItemsField
            | Details::GetMapValuesField
            | Details::UnknownType(_) => ErrorClass::Schema,

            Details::EncodeValueAsSchemaError { .. }
            | Details::IntOutOfRange(_)
            | Details::CompareFixedSizes { .. }
            | Details::GetEnumSymbol(_)
            | Details::AmbiguousUnionValue(_)
            | Details::GetField(_)
            | Details::InvalidMetadataKey(_)
            | Details::FileHeaderAlreadyWritten => ErrorClass::Encoding,

            Details::ReadVariableIntegerBytes(_)
            | Details::IntegerOverflow
            | Details::ZagI32(..)
            | Details::ReadBoolean(_)
            | Details::ReadFloat(_)
            | Details::ReadDouble(_)
            | Details::ReadBytes(_)
            | Details::ReadString(_)
            | Details::ReadFixed(..)
            | Details::ConvertToUtf8(_)
            | Details::ConvertI64ToUsize(..)
            | Details::MemoryAllocation { .. }
            | Details::GetUnionVariant { .. }
            | Details::GetEnumValue { .. } => ErrorClass::Decoding,

            Details::HeaderMagic
            | Details::GetHeaderMetadata
            | Details::GetAvroSchemaFromMap
            | Details::CodecNotSupported(_)
            | Details::ReadMarker(_)
            | Details::ReadBlockMarker(_)
            | Details::GetBlockMarker => ErrorClass::Container,

            Details::WriteBytes(_)
            | Details::FlushWriter(_)
            | Details::WriteMarker(_)
            | Details::SeekEnd(_) => ErrorClass::Io,
        }
    }

    /// Whether this error was caused by the input ending before a value was complete.
    pub fn is_unexpected_eof(&self) -> bool {
        match self {
            Details::ReadVariableIntegerBytes(e)
            | Details::ReadBoolean(e)
            | Details::ReadFloat(e)
            | Details::ReadDouble(e)
            | Details::ReadBytes(e)
            | Details::ReadString(e)
            | Details::ReadFixed(e, _)
            | Details::ReadMarker(e)
            | Details::ReadBlockMarker(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}
