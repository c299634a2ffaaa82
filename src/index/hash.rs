//! MurmurHash3 (x86, 32-bit) for skill strings.

use std::io::Cursor;

/// Seed used by the skill tables.
pub const SKILL_SEED: u32 = 0x9747_b28c;

/// Hash `bytes` with `seed`. Reads from memory, so the crate's I/O error
/// cannot occur.
#[must_use]
pub fn murmur3_32(bytes: &[u8], seed: u32) -> u32 {
    murmur3::murmur3_32(&mut Cursor::new(bytes), seed).unwrap_or(0)
}

/// Hash a skill string with [`SKILL_SEED`].
#[must_use]
pub fn skill_hash(skill: &str) -> u32 {
    murmur3_32(skill.as_bytes(), SKILL_SEED)
}
