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

//! Logic handling reading from Avro format at user level.

mod block;

use crate::{
    AvroResult,
    decode::decode,
    headers::SYNC_SIZE,
    schema::Schema,
    types::Value,
};
use block::Block;
use indexmap::IndexMap;
use std::{io::Read, sync::Arc};

/// Main interface for reading Avro object container files.
///
/// The header is read when the `Reader` is created; records are then decoded lazily, one per
/// call to `next`. To be used as an iterator:
///
/// ```no_run
/// # use avrolight::Reader;
/// # use std::io::Cursor;
/// # let input = Cursor::new(Vec::<u8>::new());
/// for value in Reader::new(input).unwrap() {
///     match value {
///         Ok(v) => println!("{:?}", v),
///         Err(e) => println!("Error: {}", e),
///     };
/// }
/// ```
///
/// After the first error the iterator is exhausted.
pub struct Reader<R> {
    block: Block<R>,
    errored: bool,
}

impl<R: Read> Reader<R> {
    /// Creates a `Reader` given something implementing the `io::Read` trait to read from.
    ///
    /// **NOTE** The avro header is going to be read automatically upon creation of the `Reader`.
    pub fn new(reader: R) -> AvroResult<Reader<R>> {
        Ok(Reader {
            block: Block::new(reader)?,
            errored: false,
        })
    }

    /// Get a reference to the writer `Schema`.
    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.block.header.schema
    }

    /// The marker closing every block of this container.
    #[inline]
    pub fn sync_marker(&self) -> &[u8; SYNC_SIZE] {
        &self.block.header.marker
    }

    /// Get a reference to the user metadata
    #[inline]
    pub fn user_metadata(&self) -> &IndexMap<String, Vec<u8>> {
        &self.block.header.user_metadata
    }
}

impl<R: Read> Iterator for Reader<R> {
    type Item = AvroResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        // to prevent keep on reading after the first error occurs
        if self.errored {
            return None;
        };
        match self.block.read_next() {
            Ok(opt) => opt.map(Ok),
            Err(e) => {
                self.errored = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode a `Value` encoded in Avro format given its `Schema` and anything implementing `io::Read`
/// to read from.
///
/// **NOTE** This function has a quite small niche of usage and does NOT take care of reading the
/// header and consecutive data blocks; use [`Reader`](struct.Reader.html) if you don't know what
/// you are doing, instead.
pub fn from_avro_datum<R: Read>(schema: &Schema, reader: &mut R) -> AvroResult<Value> {
    decode(schema, reader)
}

/// Decode one `Value` from the start of `bytes`.
///
/// Returns the value and the number of bytes it took, so the next datum starts at
/// `&bytes[consumed..]`.
pub fn from_avro_slice(schema: &Schema, bytes: &[u8]) -> AvroResult<(Value, usize)> {
    let mut remaining = bytes;
    let value = decode(schema, &mut remaining)?;
    Ok((value, bytes.len() - remaining.len()))
}
