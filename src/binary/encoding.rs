// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary encoding primitives: varints, length-prefixed strings, floats.
//!
//! Integers that are usually small go through LEB128 varints. Floats are
//! fixed 4-byte little-endian. Decoding never trusts a length: every count is
//! checked against the bytes that remain and against the header limits.
//!
//! # References
//!
//! - **Varint (LEB128)**: Little-endian base-128 variable-length integer encoding.
//!   Originally from DWARF debugging format (1992+), popularized by Protocol Buffers.
//!   See: DWARF4 specification §7.6 "Variable Length Data", and
//!   Google Protocol Buffers encoding: <https://protobuf.dev/programming-guides/encoding/>

use std::io;

use super::header::{MAX_STRING_LEN, MAX_VARINT_BYTES};

// ============================================================================
// VARINT ENCODING
// ============================================================================

pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        } else {
            buf.push(byte | 0x80);
        }
    }
}

/// Decode a varint from bytes, returning (value, bytes_consumed)
///
/// Returns an error if:
/// - Buffer is empty
/// - Varint exceeds MAX_VARINT_BYTES (malformed/malicious input)
pub fn decode_varint(bytes: &[u8]) -> io::Result<(u64, usize)> {
    if bytes.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Empty buffer for varint",
        ));
    }

    let mut result: u64 = 0;
    let mut shift = 0;
    let mut i = 0;

    while i < bytes.len() && i < MAX_VARINT_BYTES {
        let byte = bytes[i];
        result |= ((byte & 0x7F) as u64) << shift;
        i += 1;
        if byte & 0x80 == 0 {
            return Ok((result, i));
        }
        shift += 7;
    }

    // If we get here, either buffer ended mid-varint or varint is too long
    if i >= MAX_VARINT_BYTES {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Varint exceeds maximum length (possible corruption)",
        ))
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Incomplete varint",
        ))
    }
}

// ============================================================================
// STRINGS AND FLOATS
// ============================================================================

pub fn encode_str(s: &str, buf: &mut Vec<u8>) {
    encode_varint(s.len() as u64, buf);
    buf.extend_from_slice(s.as_bytes());
}

pub fn encode_f32(value: f32, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&value.to_le_bytes());
}

// ============================================================================
// SECTION READER
// ============================================================================

/// Bounds-checked cursor over one section.
#[derive(Debug, Clone)]
pub struct SectionReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SectionReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    pub fn varint(&mut self) -> io::Result<u64> {
        let (value, consumed) = decode_varint(&self.bytes[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    /// A varint that must fit `u32`.
    pub fn varint_u32(&mut self) -> io::Result<u32> {
        let value = self.varint()?;
        u32::try_from(value).map_err(|_| invalid(format!("Value {} overflows u32", value)))
    }

    /// An element count, rejected when it cannot possibly fit the remaining
    /// bytes (each element takes at least `min_element_bytes`) or exceeds `max`.
    pub fn count(&mut self, min_element_bytes: usize, max: usize) -> io::Result<usize> {
        let count = self.varint()?;
        let count = usize::try_from(count).map_err(|_| invalid("Count overflows usize"))?;
        if count > max {
            return Err(invalid(format!("Count {} exceeds limit {}", count, max)));
        }
        let needed = count.checked_mul(min_element_bytes.max(1));
        if needed.map_or(true, |needed| needed > self.remaining()) {
            return Err(invalid(format!(
                "Count {} exceeds available bytes {}",
                count,
                self.remaining()
            )));
        }
        Ok(count)
    }

    pub fn bytes(&mut self, len: usize) -> io::Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| invalid("Length causes overflow"))?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated section")
        })?;
        self.pos = end;
        Ok(slice)
    }

    pub fn u8(&mut self) -> io::Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn f32(&mut self) -> io::Result<f32> {
        let b = self.bytes(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn string(&mut self) -> io::Result<String> {
        let len = self.varint()? as usize;
        if len > MAX_STRING_LEN {
            return Err(invalid(format!("String length {} exceeds limit", len)));
        }
        let raw = self.bytes(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| invalid("Invalid UTF-8 in string"))
    }
}

pub(crate) fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
