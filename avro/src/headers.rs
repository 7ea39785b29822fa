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

//! The header of an Avro object container file.

use crate::{
    AvroResult, Error,
    decode::decode_internal,
    encode::encode_internal,
    error::Details,
    schema::{FixedSchema, MapSchema, Names, RecordField, RecordSchema, Schema, SchemaNode},
    types::Value,
};
use indexmap::IndexMap;
use log::warn;
use std::{
    io::{Read, Write},
    sync::Arc,
};

/// The magic bytes every object container file starts with.
pub const AVRO_OBJECT_HEADER: &[u8; 4] = b"Obj\x01";
/// The length of the marker written after the header and after every block.
pub const SYNC_SIZE: usize = 16;
/// Metadata key holding the JSON of the writer schema.
pub const SCHEMA_KEY: &str = "avro.schema";
/// Metadata key holding the name of the block codec.
pub const CODEC_KEY: &str = "avro.codec";
/// The only supported codec: blocks are stored as is.
pub const NULL_CODEC: &str = "null";

fn magic_schema() -> SchemaNode {
    SchemaNode::Fixed(FixedSchema {
        name: Some("Magic".to_string()),
        size: AVRO_OBJECT_HEADER.len(),
    })
}

fn meta_schema() -> SchemaNode {
    SchemaNode::Map(MapSchema {
        values: Box::new(SchemaNode::Bytes),
    })
}

fn sync_schema() -> SchemaNode {
    SchemaNode::Fixed(FixedSchema {
        name: Some("Sync".to_string()),
        size: SYNC_SIZE,
    })
}

/// The schema of the container header, as described by the Avro specification.
fn header_schema() -> SchemaNode {
    SchemaNode::Record(RecordSchema {
        name: Some("org.apache.avro.file.Header".to_string()),
        fields: vec![
            RecordField {
                name: "magic".to_string(),
                schema: magic_schema(),
            },
            RecordField {
                name: "meta".to_string(),
                schema: meta_schema(),
            },
            RecordField {
                name: "sync".to_string(),
                schema: sync_schema(),
            },
        ],
    })
}

/// What the header of a container tells about its content.
#[derive(Debug, Clone)]
pub struct Header {
    /// The schema every record of the container is written with.
    pub schema: Arc<Schema>,
    /// The marker closing every block.
    pub marker: [u8; SYNC_SIZE],
    /// Metadata entries that are not reserved by Avro, in the order they were written.
    pub user_metadata: IndexMap<String, Vec<u8>>,
}

impl Header {
    /// Read a header from the current position of `reader`.
    pub fn read<R: Read>(reader: &mut R) -> AvroResult<Header> {
        let names = Names::new();

        match decode_internal(&magic_schema(), &names, reader) {
            Ok(Value::Fixed(bytes)) if bytes == AVRO_OBJECT_HEADER => {}
            Ok(_) => return Err(Details::HeaderMagic.into()),
            Err(e) if e.details().is_unexpected_eof() => return Err(Details::HeaderMagic.into()),
            Err(e) => return Err(e),
        }

        let Value::Map(metadata) = decode_internal(&meta_schema(), &names, reader)? else {
            return Err(Details::GetHeaderMetadata.into());
        };
        let mut metadata = metadata
            .into_iter()
            .map(|(key, value)| match value {
                Value::Bytes(bytes) => Ok((key, bytes)),
                _ => Err(Error::from(Details::GetHeaderMetadata)),
            })
            .collect::<AvroResult<IndexMap<_, _>>>()?;

        let schema = read_writer_schema(&mut metadata)?;
        read_codec(&mut metadata)?;

        let mut user_metadata = IndexMap::with_capacity(metadata.len());
        for (key, value) in metadata {
            if key.starts_with("avro.") {
                warn!("Ignoring unknown metadata key: {key}");
            } else {
                user_metadata.insert(key, value);
            }
        }

        let marker = match decode_internal(&sync_schema(), &names, reader)
            .map_err(Error::into_details)
        {
            Ok(Value::Fixed(bytes)) => <[u8; SYNC_SIZE]>::try_from(bytes).ok(),
            Ok(_) => None,
            Err(Details::ReadFixed(e, _)) => return Err(Details::ReadMarker(e).into()),
            Err(details) => return Err(details.into()),
        }
        .ok_or_else(|| Details::ReadMarker(std::io::ErrorKind::InvalidData.into()))?;

        Ok(Header {
            schema: Arc::new(schema),
            marker,
            user_metadata,
        })
    }

    /// Write a header for `schema` to `writer`. Returns the number of bytes written.
    pub fn write<W: Write>(
        schema: &Schema,
        marker: &[u8; SYNC_SIZE],
        user_metadata: &IndexMap<String, Vec<u8>>,
        writer: &mut W,
    ) -> AvroResult<usize> {
        let mut metadata = IndexMap::with_capacity(user_metadata.len() + 2);
        metadata.insert(
            SCHEMA_KEY.to_string(),
            Value::Bytes(schema.canonical_json().into_bytes()),
        );
        metadata.insert(
            CODEC_KEY.to_string(),
            Value::Bytes(NULL_CODEC.as_bytes().to_vec()),
        );
        for (key, value) in user_metadata {
            metadata.insert(key.clone(), Value::Bytes(value.clone()));
        }

        let header = Value::record([
            ("magic", Value::Fixed(AVRO_OBJECT_HEADER.to_vec())),
            ("meta", Value::Map(metadata)),
            ("sync", Value::Fixed(marker.to_vec())),
        ]);
        encode_internal(&header, &header_schema(), &Names::new(), writer)
    }
}

fn read_writer_schema(metadata: &mut IndexMap<String, Vec<u8>>) -> AvroResult<Schema> {
    let json = metadata
        .shift_remove(SCHEMA_KEY)
        .ok_or(Details::GetAvroSchemaFromMap)?;
    let json = serde_json::from_slice(&json).map_err(Details::ParseSchemaJson)?;
    Schema::new(json)
}

fn read_codec(metadata: &mut IndexMap<String, Vec<u8>>) -> AvroResult<()> {
    match metadata.shift_remove(CODEC_KEY) {
        None => Ok(()),
        Some(codec) if codec == NULL_CODEC.as_bytes() => Ok(()),
        Some(codec) => {
            Err(Details::CodecNotSupported(String::from_utf8_lossy(&codec).into_owned()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use avrolight_test_helper::{
        TestResult,
        logger::{assert_logged, assert_not_logged},
    };
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"{"type":"record","name":"Test","fields":[{"name":"f","type":"long"}]}"#;

    fn raw_header(metadata: &[(&str, &[u8])], marker: &[u8; SYNC_SIZE]) -> Vec<u8> {
        let meta = Value::Map(
            metadata
                .iter()
                .map(|(k, v)| (k.to_string(), Value::Bytes(v.to_vec())))
                .collect(),
        );
        let header = Value::record([
            ("magic", Value::Fixed(AVRO_OBJECT_HEADER.to_vec())),
            ("meta", meta),
            ("sync", Value::Fixed(marker.to_vec())),
        ]);
        let mut buf = Vec::new();
        encode_internal(&header, &header_schema(), &Names::new(), &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_write_then_read() -> TestResult {
        let schema = Schema::parse_str(SCHEMA)?;
        let marker = [7u8; SYNC_SIZE];
        let mut user_metadata = IndexMap::new();
        user_metadata.insert("owner".to_string(), b"me".to_vec());

        let mut buf = Vec::new();
        let written = Header::write(&schema, &marker, &user_metadata, &mut buf)?;
        assert_eq!(written, buf.len());
        assert_eq!(&buf[..4], AVRO_OBJECT_HEADER);
        assert_eq!(&buf[buf.len() - SYNC_SIZE..], &marker);

        let header = Header::read(&mut buf.as_slice())?;
        assert_eq!(*header.schema, schema);
        assert_eq!(header.marker, marker);
        assert_eq!(header.user_metadata, user_metadata);
        Ok(())
    }

    #[test]
    fn test_schema_is_written_compact() -> TestResult {
        let schema = Schema::parse_str(SCHEMA)?;
        let mut buf = Vec::new();
        Header::write(&schema, &[0; SYNC_SIZE], &IndexMap::new(), &mut buf)?;
        let needle = SCHEMA.as_bytes();
        assert!(buf.windows(needle.len()).any(|window| window == needle));
        Ok(())
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = raw_header(&[(SCHEMA_KEY, SCHEMA.as_bytes())], &[0; SYNC_SIZE]);
        buf[3] = 2;
        let err = Header::read(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err.details(), Details::HeaderMagic));
        assert!(err.is_corruption());

        let err = Header::read(&mut &b"Ob"[..]).unwrap_err();
        assert!(matches!(err.details(), Details::HeaderMagic));
    }

    #[test]
    fn test_missing_schema() {
        let buf = raw_header(&[(CODEC_KEY, b"null")], &[0; SYNC_SIZE]);
        let err = Header::read(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err.details(), Details::GetAvroSchemaFromMap));
        assert_eq!(err.class(), ErrorClass::Container);
    }

    #[test]
    fn test_codec_other_than_null_is_rejected() {
        let buf = raw_header(
            &[(SCHEMA_KEY, SCHEMA.as_bytes()), (CODEC_KEY, b"deflate")],
            &[0; SYNC_SIZE],
        );
        let err = Header::read(&mut buf.as_slice()).unwrap_err();
        assert!(
            matches!(err.into_details(), Details::CodecNotSupported(codec) if codec == "deflate")
        );
    }

    #[test]
    fn test_missing_codec_means_null() -> TestResult {
        let buf = raw_header(&[(SCHEMA_KEY, SCHEMA.as_bytes())], &[3; SYNC_SIZE]);
        let header = Header::read(&mut buf.as_slice())?;
        assert_eq!(header.marker, [3; SYNC_SIZE]);
        assert!(header.user_metadata.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_avro_keys_are_logged() -> TestResult {
        avrolight_test_helper::init();
        let buf = raw_header(
            &[
                (SCHEMA_KEY, SCHEMA.as_bytes()),
                ("avro.codec.compression_level", b"9"),
                ("team", b"storage"),
            ],
            &[0; SYNC_SIZE],
        );
        let header = Header::read(&mut buf.as_slice())?;
        assert_logged("Ignoring unknown metadata key: avro.codec.compression_level");
        assert_not_logged("Ignoring unknown metadata key: team");
        assert_eq!(
            header.user_metadata.get("team").map(Vec::as_slice),
            Some(&b"storage"[..])
        );
        Ok(())
    }

    #[test]
    fn test_truncated_marker() {
        let buf = raw_header(&[(SCHEMA_KEY, SCHEMA.as_bytes())], &[0; SYNC_SIZE]);
        let err = Header::read(&mut &buf[..buf.len() - 1]).unwrap_err();
        assert!(matches!(err.details(), Details::ReadMarker(_)));
        assert!(err.is_corruption());
    }
}
