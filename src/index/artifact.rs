//! Index artifact (de)serialization.
//!
//! Payload: `varint(entry count)` then per entry
//! `varint(skill len) | skill bytes | varint(count) | varint gaps...`.
//! The payload is wrapped by [`crate::codec::block`] before hitting disk.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use super::dictionary::SkillDictionary;
use crate::codec::block::{self, CompressionLevel};
use crate::codec::varint::{ByteReader, decode_postings, encode_postings, write_varint};
use crate::error::{JobdexError, Result};

/// Sizes of one artifact on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactStats {
    pub entries: usize,
    pub postings: usize,
    pub payload_bytes: usize,
    pub artifact_bytes: usize,
}

impl ArtifactStats {
    /// Payload bytes per artifact byte.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.artifact_bytes == 0 {
            0.0
        } else {
            self.payload_bytes as f64 / self.artifact_bytes as f64
        }
    }
}

/// Serialize every non-empty entry, ordered by skill.
pub fn serialize(dict: &SkillDictionary) -> Result<Vec<u8>> {
    let entries: Vec<_> = dict
        .sorted_entries()
        .into_iter()
        .filter(|entry| !entry.offsets.is_empty())
        .collect();

    let mut payload = Vec::with_capacity(dict.len() * 16 + dict.total_postings() * 2);
    write_varint(entries.len() as u64, &mut payload);
    for entry in entries {
        write_varint(entry.skill.len() as u64, &mut payload);
        payload.extend_from_slice(entry.skill.as_bytes());
        encode_postings(&entry.offsets, &mut payload)?;
    }
    Ok(payload)
}

/// Rebuild a dictionary from a decompressed payload, validating every entry.
pub fn deserialize(payload: &[u8]) -> Result<SkillDictionary> {
    let mut reader = ByteReader::new(payload);
    let count = reader.read_len()?;
    // An entry takes at least 3 bytes (length, count, one gap).
    let mut dict = SkillDictionary::with_capacity((count.min(payload.len() / 3)) * 4 / 3 + 1);

    for idx in 0..count {
        let skill_len = reader.read_len()?;
        let raw = reader.read_bytes(skill_len)?;
        let skill = std::str::from_utf8(raw)
            .map_err(|err| JobdexError::CorruptIndex(format!("entry {idx}: skill is not UTF-8: {err}")))?
            .to_string();
        let offsets = decode_postings(&mut reader)?;
        if offsets.is_empty() {
            return Err(JobdexError::CorruptIndex(format!(
                "entry {idx} ('{skill}') has an empty posting list"
            )));
        }
        if !dict.insert_postings(skill.clone(), offsets) {
            return Err(JobdexError::CorruptIndex(format!(
                "skill '{skill}' appears more than once"
            )));
        }
    }

    if !reader.is_empty() {
        return Err(JobdexError::CorruptIndex(format!(
            "{} trailing bytes after {count} entries",
            reader.remaining()
        )));
    }
    Ok(dict)
}

/// Serialize, compress and atomically write `dict` to `path`.
pub fn write(path: &Path, dict: &SkillDictionary, level: CompressionLevel) -> Result<ArtifactStats> {
    let payload = serialize(dict)?;
    let artifact = block::compress(&payload, level)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|err| JobdexError::Build(format!("create {}: {err}", dir.display())))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|err| JobdexError::Build(format!("temp file in {}: {err}", dir.display())))?;
    tmp.write_all(&artifact)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| JobdexError::Build(format!("write index artifact: {err}")))?;
    tmp.persist(path)
        .map_err(|err| JobdexError::Build(format!("persist {}: {}", path.display(), err.error)))?;

    debug!(
        path = %path.display(),
        payload_bytes = payload.len(),
        artifact_bytes = artifact.len(),
        "index artifact written"
    );

    Ok(ArtifactStats {
        entries: dict.iter().filter(|entry| !entry.offsets.is_empty()).count(),
        postings: dict.total_postings(),
        payload_bytes: payload.len(),
        artifact_bytes: artifact.len(),
    })
}

/// Read and fully decode the artifact at `path`.
pub fn read(path: &Path) -> Result<(SkillDictionary, ArtifactStats)> {
    let artifact = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(JobdexError::MissingIndex(path.to_path_buf()));
        }
        Err(err) => return Err(JobdexError::Io(err)),
    };
    let payload = block::decompress(&artifact)?;
    let dict = deserialize(&payload)?;
    let stats = ArtifactStats {
        entries: dict.len(),
        postings: dict.total_postings(),
        payload_bytes: payload.len(),
        artifact_bytes: artifact.len(),
    };
    Ok((dict, stats))
}
