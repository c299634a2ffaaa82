//! Chained hash table from skill string to sorted record offsets.
//!
//! Buckets are owned `Vec`s of entries; the table doubles when the load
//! factor passes 0.75 or an insert leaves a chain longer than
//! [`MAX_CHAIN_LEN`]. Every entry's offsets stay ascending and
//! duplicate-free after each call, so serialization can delta-encode
//! without a sort pass.

use super::hash::skill_hash;

/// Chain length that forces a resize.
pub const MAX_CHAIN_LEN: usize = 8;

/// Capacity used by [`SkillDictionary::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

const MIN_CAPACITY: usize = 16;

/// Past this size only the load factor triggers growth. Identical 32-bit
/// hashes can never be split by doubling.
const CHAIN_RESIZE_LIMIT: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillEntry {
    pub skill: String,
    pub offsets: Vec<u64>,
    hash: u32,
}

impl SkillEntry {
    fn new(skill: String, hash: u32) -> Self {
        Self {
            skill,
            offsets: Vec::new(),
            hash,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillDictionary {
    buckets: Vec<Vec<SkillEntry>>,
    len: usize,
    postings: usize,
}

impl Default for SkillDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillDictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a table with at least `capacity` buckets, rounded up to a power of two.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        Self {
            buckets: (0..capacity).map(|_| Vec::new()).collect(),
            len: 0,
            postings: 0,
        }
    }

    /// Number of distinct skills.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Sum of posting list lengths.
    #[must_use]
    pub const fn total_postings(&self) -> usize {
        self.postings
    }

    #[must_use]
    pub fn max_chain_len(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Record that `skill` occurs in the record starting at `offset`.
    pub fn add_offset(&mut self, skill: &str, offset: u64) {
        let hash = skill_hash(skill);
        let idx = self.bucket_index(hash);
        let chain = &mut self.buckets[idx];

        if let Some(entry) = chain
            .iter_mut()
            .find(|entry| entry.hash == hash && entry.skill == skill)
        {
            if insert_sorted(&mut entry.offsets, offset) {
                self.postings += 1;
            }
            return;
        }

        let mut entry = SkillEntry::new(skill.to_string(), hash);
        entry.offsets.push(offset);
        chain.push(entry);
        let chain_len = chain.len();
        self.len += 1;
        self.postings += 1;
        self.grow_if_needed(chain_len);
    }

    /// Insert a complete posting list. Returns `false`, leaving the table
    /// untouched, when `skill` is already present.
    pub fn insert_postings(&mut self, skill: String, offsets: Vec<u64>) -> bool {
        let hash = skill_hash(&skill);
        let idx = self.bucket_index(hash);
        let chain = &mut self.buckets[idx];
        if chain
            .iter()
            .any(|entry| entry.hash == hash && entry.skill == skill)
        {
            return false;
        }

        let count = offsets.len();
        chain.push(SkillEntry {
            skill,
            offsets,
            hash,
        });
        let chain_len = chain.len();
        self.len += 1;
        self.postings += count;
        self.grow_if_needed(chain_len);
        true
    }

    #[must_use]
    pub fn get(&self, skill: &str) -> Option<&[u64]> {
        let hash = skill_hash(skill);
        self.buckets[self.bucket_index(hash)]
            .iter()
            .find(|entry| entry.hash == hash && entry.skill == skill)
            .map(|entry| entry.offsets.as_slice())
    }

    /// Iterate entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillEntry> {
        self.buckets.iter().flatten()
    }

    /// Entries ordered by skill, for deterministic serialization.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<&SkillEntry> {
        let mut entries: Vec<&SkillEntry> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.skill.cmp(&b.skill));
        entries
    }

    /// Replay every `(skill, offset)` pair of `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        for entry in other.buckets.into_iter().flatten() {
            for offset in entry.offsets {
                self.add_offset(&entry.skill, offset);
            }
        }
    }

    fn bucket_index(&self, hash: u32) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    fn grow_if_needed(&mut self, chain_len: usize) {
        let capacity = self.buckets.len();
        let overloaded = self.len * 4 > capacity * 3;
        let long_chain = chain_len > MAX_CHAIN_LEN && capacity < CHAIN_RESIZE_LIMIT;
        if overloaded || long_chain {
            self.resize(capacity * 2);
        }
    }

    fn resize(&mut self, new_capacity: usize) {
        let old = std::mem::replace(
            &mut self.buckets,
            (0..new_capacity).map(|_| Vec::new()).collect(),
        );
        for entry in old.into_iter().flatten() {
            let idx = self.bucket_index(entry.hash);
            self.buckets[idx].push(entry);
        }
    }
}

/// Insert keeping `offsets` ascending; returns `false` for a duplicate.
fn insert_sorted(offsets: &mut Vec<u64>, offset: u64) -> bool {
    match offsets.last() {
        None => {
            offsets.push(offset);
            true
        }
        Some(&last) if offset > last => {
            offsets.push(offset);
            true
        }
        Some(&last) if offset == last => false,
        Some(_) => match offsets.binary_search(&offset) {
            Ok(_) => false,
            Err(pos) => {
                offsets.insert(pos, offset);
                true
            }
        },
    }
}
