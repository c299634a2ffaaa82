//! Whole-payload zstd framing.
//!
//! Artifact layout: `[u64 LE uncompressed length][zstd frame]`.

use crate::error::{JobdexError, Result};

/// Size of the uncompressed-length header.
pub const HEADER_LEN: usize = 8;

/// Refuse to allocate more than this for a single decoded payload.
pub const MAX_PAYLOAD_LEN: u64 = 4 * 1024 * 1024 * 1024;

/// Compression level (1-22 for zstd).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(pub i32);

impl CompressionLevel {
    pub const FAST: Self = Self(1);
    pub const DEFAULT: Self = Self(3);
    pub const BEST: Self = Self(19);
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Compress `bytes` into an artifact with the length header prepended.
pub fn compress(bytes: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    let bound = zstd::zstd_safe::compress_bound(bytes.len());
    let mut artifact = vec![0u8; HEADER_LEN + bound];
    artifact[..HEADER_LEN].copy_from_slice(&(bytes.len() as u64).to_le_bytes());

    let written = zstd::bulk::compress_to_buffer(bytes, &mut artifact[HEADER_LEN..], level.0)
        .map_err(|err| JobdexError::Serialization(format!("zstd compress: {err}")))?;
    artifact.truncate(HEADER_LEN + written);
    Ok(artifact)
}

/// Inverse of [`compress`]; the decoded size must equal the declared length.
pub fn decompress(artifact: &[u8]) -> Result<Vec<u8>> {
    let (header, frame) = artifact.split_at_checked(HEADER_LEN).ok_or_else(|| {
        JobdexError::CorruptIndex(format!(
            "artifact is {} bytes, shorter than its {HEADER_LEN}-byte header",
            artifact.len()
        ))
    })?;

    let mut raw = [0u8; HEADER_LEN];
    raw.copy_from_slice(header);
    let declared = u64::from_le_bytes(raw);
    if declared > MAX_PAYLOAD_LEN {
        return Err(JobdexError::CorruptIndex(format!(
            "declared payload length {declared} exceeds limit"
        )));
    }
    let declared = usize::try_from(declared)
        .map_err(|_| JobdexError::CorruptIndex(format!("payload length {declared} exceeds usize")))?;

    let payload = zstd::bulk::decompress(frame, declared)
        .map_err(|err| JobdexError::CorruptIndex(format!("zstd decompress: {err}")))?;
    if payload.len() != declared {
        return Err(JobdexError::CorruptIndex(format!(
            "decompressed {} bytes, header declared {declared}",
            payload.len()
        )));
    }
    Ok(payload)
}
