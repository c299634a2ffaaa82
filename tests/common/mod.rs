//! Common test utilities shared across integration tests.
//!
//! Kept independent of the crate's internal `test_utils`, which only exist
//! under `cfg(test)` for unit tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Small job store with known byte offsets:
/// 0 `1,Java,Python`, 14 `2,Go,Rust`, 24 `3,Java,Go,Docker`, 41 `4,"Rust", Kubernetes`.
pub const JOBS: &str = "1,Java,Python\n2,Go,Rust\n3,Java,Go,Docker\n4,\"Rust\", Kubernetes\n";

/// Temporary jobdex root with a record store in it.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new(records: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("data.csv"), records).expect("Failed to write store");
        println!("[WORKSPACE] {:?} ({} bytes of records)", dir.path(), records.len());
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> PathBuf {
        self.dir.path().join("data.csv")
    }

    pub fn artifact(&self) -> PathBuf {
        self.dir.path().join("dist/jobs.idx.zst")
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("jobdex.toml");
        std::fs::write(&path, contents).expect("Failed to write config");
        path
    }
}

/// Store of `count` records where record `i` has skills `s{i%7}`, `t{i%11}`
/// and `all`. Returns the content and each record's offset.
pub fn generated_store(count: usize) -> (String, Vec<u64>) {
    let mut content = String::new();
    let mut offsets = Vec::with_capacity(count);
    for i in 0..count {
        offsets.push(content.len() as u64);
        content.push_str(&format!("{i},s{},t{},all\n", i % 7, i % 11));
    }
    (content, offsets)
}
