use jobdex::JobdexError;
use jobdex::index::{Indexer, SkillIndex};

use crate::common::{JOBS, Workspace, generated_store};

#[test]
fn test_build_then_load() {
    let ws = Workspace::new(JOBS);
    let report = Indexer::new(ws.store(), ws.artifact())
        .with_workers(2)
        .build()
        .unwrap();
    assert_eq!(report.records, 4);
    assert_eq!(report.skills, 6);
    assert_eq!(report.postings, 9);

    let index = SkillIndex::load(ws.artifact()).unwrap();
    assert_eq!(index.len(), 6);
    assert_eq!(index.get("Java"), Some(&[0u64, 24][..]));
    assert_eq!(index.get("Rust"), Some(&[14u64, 41][..]));
    assert_eq!(index.get("Kubernetes"), Some(&[41u64][..]));
    assert_eq!(index.get("java"), None);
}

#[test]
fn test_rebuild_is_byte_identical_across_worker_counts() {
    let (content, _) = generated_store(3_000);
    let ws = Workspace::new(&content);

    let mut artifacts = Vec::new();
    for workers in [1, 3, 8] {
        Indexer::new(ws.store(), ws.artifact())
            .with_workers(workers)
            .build()
            .unwrap();
        artifacts.push(std::fs::read(ws.artifact()).unwrap());
    }
    assert_eq!(artifacts[0], artifacts[1]);
    assert_eq!(artifacts[1], artifacts[2]);
}

#[test]
fn test_every_record_lands_in_its_postings() {
    let (content, offsets) = generated_store(500);
    let ws = Workspace::new(&content);
    Indexer::new(ws.store(), ws.artifact())
        .with_workers(4)
        .build()
        .unwrap();
    let index = SkillIndex::load(ws.artifact()).unwrap();

    assert_eq!(index.get("all").unwrap(), offsets.as_slice());
    let expected: Vec<u64> = offsets
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 7 == 3)
        .map(|(_, &offset)| offset)
        .collect();
    assert_eq!(index.get("s3").unwrap(), expected.as_slice());
}

#[test]
fn test_missing_store_fails_cleanly() {
    let ws = Workspace::new(JOBS);
    let err = Indexer::new(ws.root().join("missing.csv"), ws.artifact())
        .build()
        .unwrap_err();
    assert!(matches!(err, JobdexError::MissingStore(_)));
    assert!(!ws.artifact().exists());
}

#[test]
fn test_corrupt_artifact_is_rejected() {
    let ws = Workspace::new(JOBS);
    Indexer::new(ws.store(), ws.artifact()).build().unwrap();

    let mut bytes = std::fs::read(ws.artifact()).unwrap();
    bytes.truncate(bytes.len() - 4);
    std::fs::write(ws.artifact(), &bytes).unwrap();
    assert!(matches!(
        SkillIndex::load(ws.artifact()),
        Err(JobdexError::CorruptIndex(_))
    ));
}
