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
    decode::{Decoded, decode_internal},
    error::Details,
    headers::{Header, SYNC_SIZE},
    types::Value,
    util::{self, zag_i64_or_end},
};
use log::debug;
use std::io::Read;

/// Internal Block reader.
///
/// Records are decoded straight from the stream; the byte length of a block is only used for
/// logging.
#[derive(Debug, Clone)]
pub(super) struct Block<R> {
    reader: R,
    /// Number of records left in the current block.
    message_count: usize,
    pub(super) header: Header,
}

impl<R: Read> Block<R> {
    pub(super) fn new(mut reader: R) -> AvroResult<Block<R>> {
        let header = Header::read(&mut reader)?;
        Ok(Block {
            reader,
            message_count: 0,
            header,
        })
    }

    /// Try to read the start of the next data block. Returns `false` once the stream ended
    /// cleanly at a block boundary.
    fn read_block_next(&mut self) -> AvroResult<bool> {
        while self.message_count == 0 {
            let count = match zag_i64_or_end(&mut self.reader)? {
                Decoded::Value(count) => count,
                Decoded::EndOfStream => return Ok(false),
            };
            let block_bytes = util::read_long(&mut self.reader)?;
            debug!("Reading block of {count} records, {block_bytes} bytes");

            self.message_count =
                usize::try_from(count).map_err(|e| Details::ConvertI64ToUsize(e, count))?;
            if self.message_count == 0 {
                self.read_marker()?;
            }
        }
        Ok(true)
    }

    fn read_marker(&mut self) -> AvroResult<()> {
        let mut marker = [0u8; SYNC_SIZE];
        self.reader
            .read_exact(&mut marker)
            .map_err(Details::ReadBlockMarker)?;

        if marker != self.header.marker {
            return Err(Details::GetBlockMarker.into());
        }
        Ok(())
    }

    pub(super) fn read_next(&mut self) -> AvroResult<Option<Value>> {
        if !self.read_block_next()? {
            return Ok(None);
        }

        let item = decode_internal(
            self.header.schema.root(),
            self.header.schema.names(),
            &mut self.reader,
        )?;

        self.message_count -= 1;
        if self.message_count == 0 {
            self.read_marker()?;
        }
        Ok(Some(item))
    }
}
