//! Query-time skill index.
//!
//! Loaded once from the artifact and read-only afterwards. Exact lookups go
//! through the same chained table used at build time; case-insensitive and
//! sub-term lookups scan all entries, which is fine for tens of thousands
//! of distinct skills.

use std::path::{Path, PathBuf};

use tracing::info;

use super::artifact::{self, ArtifactStats};
use super::dictionary::{SkillDictionary, SkillEntry};
use crate::error::Result;

#[derive(Debug)]
pub struct SkillIndex {
    table: SkillDictionary,
    stats: ArtifactStats,
    source: Option<PathBuf>,
}

impl SkillIndex {
    /// Load and fully decode the artifact at `path`.
    ///
    /// Fails with `MissingIndex` when the file does not exist and with
    /// `CorruptIndex` on any framing or entry error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (table, stats) = artifact::read(path)?;
        info!(
            path = %path.display(),
            skills = stats.entries,
            postings = stats.postings,
            artifact_bytes = stats.artifact_bytes,
            "skill index loaded"
        );
        Ok(Self {
            table,
            stats,
            source: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory dictionary, dropping skills without postings.
    #[must_use]
    pub fn from_dictionary(dictionary: SkillDictionary) -> Self {
        let mut table = SkillDictionary::with_capacity(dictionary.capacity());
        for entry in dictionary.iter().filter(|entry| !entry.offsets.is_empty()) {
            table.insert_postings(entry.skill.clone(), entry.offsets.clone());
        }
        let stats = ArtifactStats {
            entries: table.len(),
            postings: table.total_postings(),
            ..ArtifactStats::default()
        };
        Self {
            table,
            stats,
            source: None,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub const fn total_postings(&self) -> usize {
        self.table.total_postings()
    }

    #[must_use]
    pub const fn stats(&self) -> &ArtifactStats {
        &self.stats
    }

    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Exact, case-sensitive lookup.
    #[must_use]
    pub fn get(&self, skill: &str) -> Option<&[u64]> {
        self.table.get(skill)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillEntry> {
        self.table.iter()
    }

    /// Entries whose skill equals `needle` ignoring case, ordered by skill.
    #[must_use]
    pub fn find_case_insensitive(&self, needle: &str) -> Vec<&SkillEntry> {
        let needle = needle.to_lowercase();
        self.matching(|skill| skill.to_lowercase() == needle)
    }

    /// Entries where `needle` equals the whole stored value or one of its
    /// comma-separated sub-terms, ignoring case. A needle never matches
    /// inside a word: "java" does not hit "javascript".
    #[must_use]
    pub fn find_term(&self, needle: &str) -> Vec<&SkillEntry> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.matching(|skill| {
            skill.to_lowercase() == needle
                || skill
                    .split(',')
                    .any(|term| term.trim().to_lowercase() == needle)
        })
    }

    /// The `limit` skills with the longest posting lists.
    #[must_use]
    pub fn most_frequent(&self, limit: usize) -> Vec<&SkillEntry> {
        let mut entries: Vec<&SkillEntry> = self.iter().collect();
        entries.sort_unstable_by(|a, b| {
            b.offsets
                .len()
                .cmp(&a.offsets.len())
                .then_with(|| a.skill.cmp(&b.skill))
        });
        entries.truncate(limit);
        entries
    }

    fn matching(&self, predicate: impl Fn(&str) -> bool) -> Vec<&SkillEntry> {
        let mut entries: Vec<&SkillEntry> = self
            .iter()
            .filter(|entry| predicate(&entry.skill))
            .collect();
        entries.sort_unstable_by(|a, b| a.skill.cmp(&b.skill));
        entries
    }
}
