//! On-disk codec for the skill index.
//!
//! Two layers: [`varint`] turns integers and ascending posting lists into
//! compact byte sequences, [`block`] wraps a whole serialized payload with
//! zstd behind an 8-byte uncompressed-length header.

pub mod block;
pub mod varint;

pub use block::{compress, decompress};
pub use varint::{ByteReader, decode_postings, encode_postings, read_varint, write_varint};
