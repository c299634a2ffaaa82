//! Index build pipeline.
//!
//! 1. Split the store into `workers` contiguous byte ranges.
//! 2. Each worker realigns to the next record boundary, builds a private
//!    [`SkillDictionary`] over the records starting inside its range and
//!    sends it back over a channel.
//! 3. Once every worker has finished, the dictionaries are replayed in range
//!    order into one global dictionary.
//! 4. The global dictionary is serialized, compressed and written.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use super::artifact;
use super::dictionary::SkillDictionary;
use super::record::RecordFormat;
use crate::codec::block::CompressionLevel;
use crate::config::Config;
use crate::error::{JobdexError, Result};

/// Records between per-worker progress log lines.
const PROGRESS_EVERY: u64 = 10_000;

/// Build stages reported to [`Indexer::build_with_progress`] callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Scanning { workers: usize },
    Merging { partitions: usize },
    Writing { skills: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub store: PathBuf,
    pub artifact: PathBuf,
    pub workers: usize,
    pub records: u64,
    pub skills: usize,
    pub postings: usize,
    pub payload_bytes: usize,
    pub artifact_bytes: usize,
    #[serde(with = "humantime_serde")]
    pub scan_time: Duration,
    #[serde(with = "humantime_serde")]
    pub merge_time: Duration,
    #[serde(with = "humantime_serde")]
    pub write_time: Duration,
    #[serde(with = "humantime_serde")]
    pub total_time: Duration,
}

/// Result of scanning and merging, before anything is written.
#[derive(Debug)]
pub struct BuiltDictionary {
    pub dictionary: SkillDictionary,
    pub records: u64,
    pub scan_time: Duration,
    pub merge_time: Duration,
}

struct Partition {
    worker: usize,
    dictionary: SkillDictionary,
    records: u64,
}

#[derive(Debug, Clone)]
pub struct Indexer {
    store: PathBuf,
    artifact: PathBuf,
    format: RecordFormat,
    skip_header: bool,
    workers: usize,
    level: CompressionLevel,
    initial_capacity: usize,
}

impl Indexer {
    #[must_use]
    pub fn new(store: impl Into<PathBuf>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            artifact: artifact.into(),
            format: RecordFormat::default(),
            skip_header: false,
            workers: 4,
            level: CompressionLevel::default(),
            initial_capacity: super::dictionary::DEFAULT_CAPACITY,
        }
    }

    pub fn from_config(config: &Config, root: &Path) -> Result<Self> {
        Ok(Self {
            store: config.store_path(root),
            artifact: config.index_path(root),
            format: RecordFormat::from_config(&config.store)?,
            skip_header: config.store.skip_header,
            workers: config.index.workers,
            level: CompressionLevel(config.index.compression_level),
            initial_capacity: config.index.initial_capacity,
        })
    }

    #[must_use]
    pub fn with_store(mut self, store: impl Into<PathBuf>) -> Self {
        self.store = store.into();
        self
    }

    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifact = artifact.into();
        self
    }

    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { 1 } else { workers };
        self
    }

    #[must_use]
    pub const fn with_skip_header(mut self, skip_header: bool) -> Self {
        self.skip_header = skip_header;
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn with_compression_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.store
    }

    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    pub fn build(&self) -> Result<BuildReport> {
        self.build_with_progress(|_| {})
    }

    /// Build the index, calling `progress` as each phase starts.
    pub fn build_with_progress(&self, progress: impl Fn(BuildPhase)) -> Result<BuildReport> {
        let started = Instant::now();
        info!(
            store = %self.store.display(),
            artifact = %self.artifact.display(),
            workers = self.workers,
            "building skill index"
        );

        let built = self.build_dictionary_with_progress(&progress)?;

        progress(BuildPhase::Writing {
            skills: built.dictionary.len(),
        });
        let write_started = Instant::now();
        let stats = artifact::write(&self.artifact, &built.dictionary, self.level)?;
        let write_time = write_started.elapsed();

        let report = BuildReport {
            store: self.store.clone(),
            artifact: self.artifact.clone(),
            workers: self.workers,
            records: built.records,
            skills: stats.entries,
            postings: stats.postings,
            payload_bytes: stats.payload_bytes,
            artifact_bytes: stats.artifact_bytes,
            scan_time: built.scan_time,
            merge_time: built.merge_time,
            write_time,
            total_time: started.elapsed(),
        };
        info!(
            records = report.records,
            skills = report.skills,
            postings = report.postings,
            artifact_bytes = report.artifact_bytes,
            "skill index built"
        );
        Ok(report)
    }

    /// Scan the store and merge worker dictionaries without writing.
    pub fn build_dictionary(&self) -> Result<BuiltDictionary> {
        self.build_dictionary_with_progress(&|_| {})
    }

    fn build_dictionary_with_progress(
        &self,
        progress: &dyn Fn(BuildPhase),
    ) -> Result<BuiltDictionary> {
        let store_len = match std::fs::metadata(&self.store) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(JobdexError::MissingStore(self.store.clone()));
            }
            Err(err) => {
                return Err(JobdexError::Build(format!(
                    "stat {}: {err}",
                    self.store.display()
                )));
            }
        };

        let ranges = partition_ranges(store_len, self.workers);
        progress(BuildPhase::Scanning {
            workers: ranges.len(),
        });
        let scan_started = Instant::now();
        let partitions = self.scan_parallel(&ranges)?;
        let scan_time = scan_started.elapsed();

        progress(BuildPhase::Merging {
            partitions: partitions.len(),
        });
        let merge_started = Instant::now();
        let mut dictionary = SkillDictionary::with_capacity(self.initial_capacity);
        let mut records = 0;
        for partition in partitions {
            debug!(
                worker = partition.worker,
                records = partition.records,
                skills = partition.dictionary.len(),
                "merging partition"
            );
            records += partition.records;
            dictionary.merge(partition.dictionary);
        }
        let merge_time = merge_started.elapsed();

        Ok(BuiltDictionary {
            dictionary,
            records,
            scan_time,
            merge_time,
        })
    }

    fn scan_parallel(&self, ranges: &[Range<u64>]) -> Result<Vec<Partition>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ranges.len().max(1))
            .thread_name(|idx| format!("jobdex-index-{idx}"))
            .build()
            .map_err(|err| JobdexError::Build(format!("start index workers: {err}")))?;

        let (tx, rx) = crossbeam_channel::bounded(ranges.len());
        pool.scope(|scope| {
            for (worker, range) in ranges.iter().cloned().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let result = self.scan_partition(worker, range);
                    let _ = tx.send(result);
                });
            }
        });
        drop(tx);

        let mut partitions = rx.iter().collect::<Result<Vec<_>>>()?;
        partitions.sort_by_key(|partition| partition.worker);
        Ok(partitions)
    }

    fn scan_partition(&self, worker: usize, range: Range<u64>) -> Result<Partition> {
        let read_err = |err: std::io::Error| {
            JobdexError::Build(format!("read {}: {err}", self.store.display()))
        };

        let file = File::open(&self.store).map_err(read_err)?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut dictionary = SkillDictionary::with_capacity(self.initial_capacity);
        let mut records = 0u64;

        let mut pos = if range.start == 0 {
            0
        } else {
            // Start at the first record beginning at or after `range.start`:
            // consume from the byte before it through the next newline.
            reader
                .seek(SeekFrom::Start(range.start - 1))
                .map_err(read_err)?;
            let skipped = reader.read_until(b'\n', &mut line).map_err(read_err)?;
            range.start - 1 + skipped as u64
        };

        while pos < range.end {
            line.clear();
            let read = reader.read_until(b'\n', &mut line).map_err(read_err)?;
            if read == 0 {
                break;
            }

            if !(self.skip_header && pos == 0) {
                self.format
                    .for_each_skill(&line, |skill| dictionary.add_offset(skill, pos));
                records += 1;
                if records % PROGRESS_EVERY == 0 {
                    debug!(worker, records, offset = pos, "indexing progress");
                }
            }
            pos += read as u64;
        }

        debug!(
            worker,
            start = range.start,
            end = range.end,
            records,
            skills = dictionary.len(),
            "partition scanned"
        );
        Ok(Partition {
            worker,
            dictionary,
            records,
        })
    }
}

/// Split `[0, len)` into `workers` contiguous ranges (some may be empty).
#[must_use]
pub fn partition_ranges(len: u64, workers: usize) -> Vec<Range<u64>> {
    let workers = workers.max(1) as u64;
    (0..workers)
        .map(|idx| (idx * len / workers)..((idx + 1) * len / workers))
        .collect()
}
