//! LEB128 varints and delta-encoded posting lists.
//!
//! A posting list is written as `count` followed by `count` gaps, each gap
//! the difference to the previous offset (the first against zero). Offsets
//! must be strictly ascending, which keeps every gap positive and small.

use crate::error::{JobdexError, Result};

/// Maximum encoded length of a `u64` varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` as a little-endian base-128 varint.
pub fn write_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Decode one varint from the front of `bytes`, returning `(value, consumed)`.
pub fn read_varint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (idx, &byte) in bytes.iter().enumerate().take(MAX_VARINT_LEN) {
        let part = u64::from(byte & 0x7F);
        let shift = 7 * idx as u32;
        // The tenth byte may only carry the top bit of a u64.
        if idx == MAX_VARINT_LEN - 1 && part > 1 {
            return Err(JobdexError::CorruptIndex("varint overflows u64".to_string()));
        }
        value |= part << shift;
        if byte & 0x80 == 0 {
            return Ok((value, idx + 1));
        }
    }
    if bytes.len() >= MAX_VARINT_LEN {
        Err(JobdexError::CorruptIndex("varint longer than 10 bytes".to_string()))
    } else {
        Err(JobdexError::CorruptIndex("truncated varint".to_string()))
    }
}

/// Cursor over a decoded payload.
#[derive(Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, consumed) = read_varint(&self.bytes[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a varint that must fit in memory as a length or count.
    pub fn read_len(&mut self) -> Result<usize> {
        let value = self.read_varint()?;
        usize::try_from(value)
            .map_err(|_| JobdexError::CorruptIndex(format!("length {value} exceeds usize")))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                JobdexError::CorruptIndex(format!(
                    "expected {len} bytes at position {}, {} available",
                    self.pos,
                    self.remaining()
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

/// Append a posting list: count, then ascending gaps.
pub fn encode_postings(offsets: &[u64], buf: &mut Vec<u8>) -> Result<()> {
    write_varint(offsets.len() as u64, buf);
    let mut prev = 0u64;
    for (idx, &offset) in offsets.iter().enumerate() {
        if idx > 0 && offset <= prev {
            return Err(JobdexError::Serialization(format!(
                "posting list not strictly ascending at position {idx}: {offset} after {prev}"
            )));
        }
        write_varint(offset - prev, buf);
        prev = offset;
    }
    Ok(())
}

/// Decode a posting list written by [`encode_postings`].
pub fn decode_postings(reader: &mut ByteReader<'_>) -> Result<Vec<u64>> {
    let count = reader.read_len()?;
    // Every gap takes at least one byte; never trust the count beyond that.
    let mut offsets = Vec::with_capacity(count.min(reader.remaining()));
    let mut prev = 0u64;
    for idx in 0..count {
        let gap = reader.read_varint()?;
        if idx > 0 && gap == 0 {
            return Err(JobdexError::CorruptIndex(format!(
                "duplicate offset {prev} in posting list"
            )));
        }
        let offset = prev
            .checked_add(gap)
            .ok_or_else(|| JobdexError::CorruptIndex("posting offset overflows u64".to_string()))?;
        offsets.push(offset);
        prev = offset;
    }
    Ok(offsets)
}
