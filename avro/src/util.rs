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

use crate::{AvroResult, decode::Decoded, error::Details};
use serde_json::{Map, Value};
use std::{
    io::{ErrorKind, Read, Write},
    sync::{
        Once,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Maximum number of bytes that can be allocated when decoding
/// Avro-encoded values. This is a protection against ill-formed
/// data, whose length field might be interpreted as enormous.
/// See max_allocation_bytes to change this limit.
pub const DEFAULT_MAX_ALLOCATION_BYTES: usize = 512 * 1024 * 1024;
static MAX_ALLOCATION_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_ALLOCATION_BYTES);
static MAX_ALLOCATION_BYTES_ONCE: Once = Once::new();

/// Set a new maximum number of bytes that can be allocated when decoding data.
/// Once called, the limit cannot be changed.
///
/// **NOTE** This function must be called before decoding **any** data. The
/// library leverages [`std::sync::Once`](https://doc.rust-lang.org/std/sync/struct.Once.html)
/// to set the limit either when calling this method, or when decoding for
/// the first time.
pub fn max_allocation_bytes(num_bytes: usize) -> usize {
    MAX_ALLOCATION_BYTES_ONCE.call_once(|| {
        MAX_ALLOCATION_BYTES.store(num_bytes, Ordering::Release);
    });
    MAX_ALLOCATION_BYTES.load(Ordering::Acquire)
}

pub fn safe_len(len: usize) -> AvroResult<usize> {
    let max_bytes = max_allocation_bytes(DEFAULT_MAX_ALLOCATION_BYTES);

    if len <= max_bytes {
        Ok(len)
    } else {
        Err(Details::MemoryAllocation {
            desired: len,
            maximum: max_bytes,
        }
        .into())
    }
}

pub(crate) trait MapHelper {
    fn string(&self, key: &str) -> Option<String>;

    fn name(&self) -> Option<String> {
        self.string("name")
    }
}

impl MapHelper for Map<String, Value> {
    fn string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
    }
}

pub fn read_long<R: Read>(reader: &mut R) -> AvroResult<i64> {
    zag_i64(reader)
}

pub fn zig_i64<W: Write>(n: i64, writer: W) -> AvroResult<usize> {
    encode_variable(((n << 1) ^ (n >> 63)) as u64, writer)
}

pub fn zag_i32<R: Read>(reader: &mut R) -> AvroResult<i32> {
    let i = zag_i64(reader)?;
    i32::try_from(i).map_err(|e| Details::ZagI32(e, i).into())
}

pub fn zag_i64<R: Read>(reader: &mut R) -> AvroResult<i64> {
    let first = read_byte(reader)?;
    decode_variable(first, reader).map(unzig)
}

/// Like [`zag_i64`], but a clean end of input before the first byte is reported as
/// [`Decoded::EndOfStream`] instead of an error.
///
/// End of input after the first byte is still an error.
pub fn zag_i64_or_end<R: Read>(reader: &mut R) -> AvroResult<Decoded<i64>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(Decoded::EndOfStream),
            Ok(_) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Details::ReadVariableIntegerBytes(e).into()),
        }
    }
    decode_variable(buf[0], reader).map(|z| Decoded::Value(unzig(z)))
}

fn unzig(z: u64) -> i64 {
    (z >> 1) as i64 ^ -((z & 0x1) as i64)
}

fn read_byte<R: Read>(reader: &mut R) -> AvroResult<u8> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf[..])
        .map_err(Details::ReadVariableIntegerBytes)?;
    Ok(buf[0])
}

fn encode_variable<W: Write>(mut z: u64, mut writer: W) -> AvroResult<usize> {
    let mut buffer = [0u8; 10];
    let mut i: usize = 0;
    loop {
        if z <= 0x7F {
            buffer[i] = (z & 0x7F) as u8;
            i += 1;
            break;
        } else {
            buffer[i] = (0x80 | (z & 0x7F)) as u8;
            i += 1;
            z >>= 7;
        }
    }
    writer
        .write_all(&buffer[..i])
        .map_err(Details::WriteBytes)?;
    Ok(i)
}

fn decode_variable<R: Read>(first: u8, reader: &mut R) -> AvroResult<u64> {
    let mut byte = first;
    let mut i = 0u64;

    let mut j = 0;
    loop {
        if j > 9 {
            // if j * 7 > 64
            return Err(Details::IntegerOverflow.into());
        }
        i |= (u64::from(byte & 0x7F)) << (j * 7);
        if (byte >> 7) == 0 {
            break;
        }
        j += 1;
        byte = read_byte(reader)?;
    }

    Ok(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avrolight_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    fn zig(n: i64) -> Vec<u8> {
        let mut s = Vec::new();
        zig_i64(n, &mut s).unwrap();
        s
    }

    #[test]
    fn test_zig_i64() {
        assert_eq!(zig(0), [0]);
        assert_eq!(zig(-1), [1]);
        assert_eq!(zig(1), [2]);
        assert_eq!(zig(-2), [3]);
        assert_eq!(zig(2), [4]);
        assert_eq!(zig(-64), [127]);
        assert_eq!(zig(64), [128, 1]);
        assert_eq!(zig(i32::MAX as i64), [254, 255, 255, 255, 15]);
        assert_eq!(zig(i32::MAX as i64 + 1), [128, 128, 128, 128, 16]);
        assert_eq!(zig(i32::MIN as i64), [255, 255, 255, 255, 15]);
        assert_eq!(zig(i32::MIN as i64 - 1), [129, 128, 128, 128, 16]);
        assert_eq!(
            zig(i64::MAX),
            [254, 255, 255, 255, 255, 255, 255, 255, 255, 1]
        );
        assert_eq!(
            zig(i64::MIN),
            [255, 255, 255, 255, 255, 255, 255, 255, 255, 1]
        );
    }

    #[test]
    fn test_zag_inverts_zig() -> TestResult {
        for n in [0, -1, 1, 63, -64, 64, 1234, i32::MIN as i64, i64::MAX, i64::MIN] {
            let bytes = zig(n);
            assert_eq!(zag_i64(&mut bytes.as_slice())?, n);
        }
        Ok(())
    }

    #[test]
    fn test_zag_i32_out_of_range() {
        let bytes = zig(i32::MAX as i64 + 1);
        assert!(matches!(
            zag_i32(&mut bytes.as_slice()).map_err(crate::Error::into_details),
            Err(Details::ZagI32(_, 2147483648))
        ));
    }

    #[test]
    fn test_overflow() {
        let eleven_groups: &[u8] = &[0xff; 11];
        assert!(matches!(
            zag_i64(&mut &*eleven_groups).map_err(crate::Error::into_details),
            Err(Details::IntegerOverflow)
        ));

        let truncated: &[u8] = &[0xe1, 0xe1, 0xe1, 0xe1, 0xe1];
        assert!(zag_i64(&mut &*truncated).is_err());
    }

    #[test]
    fn test_zag_or_end() -> TestResult {
        let empty: &[u8] = &[];
        assert!(matches!(
            zag_i64_or_end(&mut &*empty)?,
            Decoded::EndOfStream
        ));

        let six: &[u8] = &[12];
        assert!(matches!(zag_i64_or_end(&mut &*six)?, Decoded::Value(6)));

        let truncated: &[u8] = &[0x80];
        assert!(zag_i64_or_end(&mut &*truncated).is_err());
        Ok(())
    }

    #[test]
    fn test_safe_len() -> TestResult {
        assert_eq!(42usize, safe_len(42usize)?);
        assert!(safe_len(1024 * 1024 * 1024).is_err());

        Ok(())
    }
}
