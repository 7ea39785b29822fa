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

//! Logic handling writing in Avro format at user level.
use crate::{
    AvroResult,
    encode::{encode_internal, encode_long, encode_to_vec},
    error::Details,
    headers::{Header, SYNC_SIZE},
    schema::Schema,
    types::Value,
};
use indexmap::IndexMap;
use log::{debug, error};
use std::{
    io::{Read, Seek, SeekFrom, Write},
    mem::ManuallyDrop,
    sync::Arc,
};

/// The size of the buffered records above which a block is written out.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Main interface for writing Avro object container files.
///
/// Records are encoded into an in-memory block which is written out, followed by the sync
/// marker, once it grows past `block_size` or when [`flush`](Writer::flush) is called. The
/// header is written on the first flush.
///
/// It is critical to call flush before `Writer<W>` is dropped. Though dropping will attempt to flush
/// the contents of the buffer, any errors that happen in the process of dropping will be ignored.
/// Calling flush ensures that the buffer is empty and thus dropping will not even attempt file operations.
pub struct Writer<W: Write> {
    schema: Arc<Schema>,
    writer: W,
    block_size: usize,
    buffer: Vec<u8>,
    num_values: usize,
    marker: [u8; SYNC_SIZE],
    has_header: bool,
    user_metadata: IndexMap<String, Vec<u8>>,
}

#[bon::bon]
impl<W: Write> Writer<W> {
    #[builder(finish_fn = build)]
    pub fn builder(
        #[builder(into)] schema: Arc<Schema>,
        writer: W,
        #[builder(default = DEFAULT_BLOCK_SIZE)] block_size: usize,
        #[builder(default = generate_sync_marker())] marker: [u8; SYNC_SIZE],
        /// Has the header already been written.
        ///
        /// To disable writing the header, this can be set to `true`.
        #[builder(default = false)]
        has_header: bool,
        #[builder(default)] user_metadata: IndexMap<String, Vec<u8>>,
    ) -> AvroResult<Self> {
        if let Some(key) = user_metadata.keys().find(|key| key.starts_with("avro.")) {
            return Err(Details::InvalidMetadataKey(key.clone()).into());
        }
        Ok(Self {
            schema,
            writer,
            block_size,
            buffer: Vec::with_capacity(block_size),
            num_values: 0,
            marker,
            has_header,
            user_metadata,
        })
    }
}

impl<W: Write> Writer<W> {
    /// Creates a `Writer` given a `Schema` and something implementing the `io::Write` trait to write
    /// to.
    pub fn new(schema: impl Into<Arc<Schema>>, writer: W) -> AvroResult<Self> {
        Self::builder().schema(schema).writer(writer).build()
    }

    /// Creates a `Writer` that will append values to already populated
    /// `std::io::Write` using the provided `marker`
    pub fn append_to(
        schema: impl Into<Arc<Schema>>,
        writer: W,
        marker: [u8; SYNC_SIZE],
    ) -> AvroResult<Self> {
        Self::builder()
            .schema(schema)
            .writer(writer)
            .marker(marker)
            .has_header(true)
            .build()
    }

    /// Get a reference to the `Schema` associated to a `Writer`.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The marker written after every block.
    pub fn sync_marker(&self) -> &[u8; SYNC_SIZE] {
        &self.marker
    }

    /// Append a value to the `Writer`.
    ///
    /// Returns the number of bytes written (it might be 0, see below).
    ///
    /// **NOTE**: This function is not guaranteed to perform any actual write, since it relies on
    /// internal buffering for performance reasons. If you want to be sure the value has been
    /// written, then call [`flush`](Writer::flush).
    pub fn append_value<T: Into<Value>>(&mut self, value: T) -> AvroResult<usize> {
        let avro = value.into();
        self.append_value_ref(&avro)
    }

    /// Append a value to the `Writer` by reference.
    ///
    /// A value that fails to encode leaves the current block untouched.
    ///
    /// Returns the number of bytes written (it might be 0, see below).
    ///
    /// **NOTE**: This function is not guaranteed to perform any actual write, since it relies on
    /// internal buffering for performance reasons. If you want to be sure the value has been
    /// written, then call [`flush`](Writer::flush).
    pub fn append_value_ref(&mut self, value: &Value) -> AvroResult<usize> {
        let start = self.buffer.len();
        if let Err(e) = encode_internal(
            value,
            self.schema.root(),
            self.schema.names(),
            &mut self.buffer,
        ) {
            self.buffer.truncate(start);
            return Err(e);
        }
        self.num_values += 1;
        if self.buffer.len() > self.block_size {
            return self.flush();
        }
        Ok(0)
    }

    /// Extend a `Writer` with an `Iterator` of values.
    ///
    /// Returns the number of bytes written.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an implicit
    /// call to [`flush`](Writer::flush) is performed).
    pub fn extend<I, T: Into<Value>>(&mut self, values: I) -> AvroResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let mut num_bytes = 0;
        for value in values {
            num_bytes += self.append_value(value)?;
        }
        num_bytes += self.flush()?;
        Ok(num_bytes)
    }

    /// Flush the content to the inner `Writer`.
    ///
    /// Call this function to make sure all the content has been written before releasing the `Writer`.
    /// This will also write the header if it wasn't written yet and hasn't been disabled using
    /// [`WriterBuilder::has_header`]. No block is written when no value was appended since the
    /// last flush.
    ///
    /// Returns the number of bytes written.
    pub fn flush(&mut self) -> AvroResult<usize> {
        let mut num_bytes = self.maybe_write_header()?;
        if self.num_values > 0 {
            debug!(
                "Writing block of {} records, {} bytes",
                self.num_values,
                self.buffer.len()
            );
            num_bytes += encode_long(self.num_values as i64, &mut self.writer)?
                + encode_long(self.buffer.len() as i64, &mut self.writer)?;
            self.writer
                .write_all(&self.buffer)
                .map_err(Details::WriteBytes)?;
            num_bytes += self.buffer.len() + self.append_marker()?;
            self.buffer.clear();
            self.num_values = 0;
        }
        self.writer.flush().map_err(Details::FlushWriter)?;
        Ok(num_bytes)
    }

    /// Return what the `Writer` is writing to, consuming the `Writer` itself.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an implicit
    /// call to [`flush`](Writer::flush) is performed).
    pub fn into_inner(mut self) -> AvroResult<W> {
        self.flush()?;
        let mut this = ManuallyDrop::new(self);
        // Extract every member that is not Copy and therefore should be dropped
        let _buffer = std::mem::take(&mut this.buffer);
        let _user_metadata = std::mem::take(&mut this.user_metadata);
        // SAFETY: the schema is not accessed after this and won't be dropped because of ManuallyDrop
        unsafe { std::ptr::drop_in_place(&mut this.schema) };
        // SAFETY: double-drops are prevented by putting `this` in a ManuallyDrop that is never dropped
        let writer = unsafe { std::ptr::read(&this.writer) };
        Ok(writer)
    }

    /// Gets a reference to the underlying writer.
    ///
    /// **NOTE**: There is likely data still in the buffer. To have all the data
    /// in the writer call [`flush`](Writer::flush) first.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Gets a mutable reference to the underlying writer.
    ///
    /// It is inadvisable to directly write to the underlying writer.
    ///
    /// **NOTE**: There is likely data still in the buffer. To have all the data
    /// in the writer call [`flush`](Writer::flush) first.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Append the synchronization marker to the payload.
    fn append_marker(&mut self) -> AvroResult<usize> {
        self.writer
            .write_all(&self.marker)
            .map_err(Details::WriteMarker)?;
        Ok(self.marker.len())
    }

    /// Adds custom metadata to the file.
    /// This method could be used only before the header is written, i.e. before the first flush.
    pub fn add_user_metadata<T: AsRef<[u8]>>(&mut self, key: String, value: T) -> AvroResult<()> {
        if !self.has_header {
            if key.starts_with("avro.") {
                return Err(Details::InvalidMetadataKey(key).into());
            }
            self.user_metadata.insert(key, value.as_ref().to_vec());
            Ok(())
        } else {
            Err(Details::FileHeaderAlreadyWritten.into())
        }
    }

    fn maybe_write_header(&mut self) -> AvroResult<usize> {
        if !self.has_header {
            let n = Header::write(
                &self.schema,
                &self.marker,
                &self.user_metadata,
                &mut self.writer,
            )?;
            self.has_header = true;
            Ok(n)
        } else {
            Ok(0)
        }
    }
}

impl<S: Read + Write + Seek> Writer<S> {
    /// Creates a `Writer` that appends records to an existing container.
    ///
    /// The header is read from the current position of `stream` to recover the schema and the
    /// sync marker, then the stream is positioned at its end.
    pub fn append_to_container(mut stream: S) -> AvroResult<Self> {
        let header = Header::read(&mut stream)?;
        stream.seek(SeekFrom::End(0)).map_err(Details::SeekEnd)?;
        Self::append_to(header.schema, stream, header.marker)
    }
}

impl<W: Write> Drop for Writer<W> {
    /// Drop the writer, will try to flush logging any errors.
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!("Failed to flush the writer on drop: {e}");
        }
    }
}

/// Encode a compatible value (implementing the `Into<Value>` trait) into Avro format, also
/// performing schema validation.
///
/// **NOTE**: This function has a quite small niche of usage and does NOT generate headers and sync
/// markers; use [`Writer`] to be fully Avro-compatible if you don't know what
/// you are doing, instead.
pub fn to_avro_datum<T: Into<Value>>(schema: &Schema, value: T) -> AvroResult<Vec<u8>> {
    encode_to_vec(&value.into(), schema)
}

#[cfg(not(target_arch = "wasm32"))]
fn generate_sync_marker() -> [u8; SYNC_SIZE] {
    rand::random()
}

#[cfg(target_arch = "wasm32")]
fn generate_sync_marker() -> [u8; SYNC_SIZE] {
    let mut marker = [0_u8; SYNC_SIZE];
    std::iter::repeat_with(quad_rand::rand)
        .take(4)
        .flat_map(|i| i.to_be_bytes())
        .enumerate()
        .for_each(|(i, n)| marker[i] = n);
    marker
}
