use drivedupe::checkpoint::{CheckpointError, CheckpointStore, ScanState};
use drivedupe::remote::{DriveSnapshot, SnapshotAdapter, SnapshotEntry};
use drivedupe::scan::{ScanCoordinator, ScanOptions};
use std::fs;
use tempfile::tempdir;

fn drive() -> DriveSnapshot {
    let mut items = Vec::new();
    for f in 0..6 {
        let folder = format!("dir{f}");
        items.push(SnapshotEntry::folder(&folder, &folder, "root"));
        for i in 0..4 {
            let id = format!("{folder}-file{i}");
            // Every hash appears in two folders
            let hash = format!("H{}-{}", f % 3, i);
            let entry = SnapshotEntry::file(&id, &id, &folder, 10 + i)
                .with_hash("sha1Hash", hash);
            items.push(entry);
        }
    }
    DriveSnapshot::new("root", items)
}

fn narrow() -> ScanOptions {
    ScanOptions::default()
        .with_tasks_per_advance(2)
        .with_worker_threads(2)
}

fn uninterrupted() -> ScanCoordinator<SnapshotAdapter> {
    let adapter = SnapshotAdapter::new(drive());
    let root = adapter.root_handle();
    let scan = ScanCoordinator::with_options("sha1Hash", adapter, narrow());
    scan.seed(root);
    while !scan.is_complete() {
        scan.advance().unwrap();
    }
    scan
}

#[test]
fn test_resume_reproduces_state_and_result() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());

    let adapter = SnapshotAdapter::new(drive());
    let root = adapter.root_handle();
    let scan = ScanCoordinator::with_options("sha1Hash", adapter, narrow());
    scan.seed(root);
    scan.advance().unwrap();
    scan.advance().unwrap();

    let saved = scan.snapshot();
    assert!(!saved.pending.is_empty());
    assert!(saved.accumulator.file_count() > 0);
    store.save(&saved, "user-token").unwrap();
    drop(scan);

    let resumed = store
        .resume("user-token", SnapshotAdapter::new(drive()), narrow())
        .unwrap();
    assert_eq!(resumed.snapshot(), saved);
    assert_eq!(resumed.stats(), saved.stats());

    while !resumed.is_complete() {
        resumed.advance().unwrap();
        store.save(&resumed.snapshot(), "user-token").unwrap();
    }

    let reference = uninterrupted();
    assert_eq!(resumed.duplicates(), reference.duplicates());
    assert_eq!(resumed.stats(), reference.stats());
    assert_eq!(resumed.duplicates().len(), 12);
}

#[test]
fn test_completed_scan_stays_complete() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let scan = uninterrupted();
    store.save(&scan.snapshot(), "tok").unwrap();

    let state = store.load("tok").unwrap();
    assert!(state.is_complete());

    let resumed = ScanCoordinator::from_state(state, SnapshotAdapter::new(drive()), narrow());
    let before = resumed.report();
    resumed.advance().unwrap();
    assert_eq!(resumed.report(), before);
}

#[test]
fn test_resume_without_checkpoint() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let result = store.resume("never-saved", SnapshotAdapter::new(drive()), narrow());
    assert!(matches!(result, Err(CheckpointError::NoSuchCheckpoint)));
}

#[test]
fn test_checkpoint_never_stores_token() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let token = "EwBwA8l6BAAU-very-secret";
    let path = store.save(&uninterrupted().snapshot(), token).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains(token));
    assert!(!path.to_string_lossy().contains(token));
}

#[test]
fn test_truncated_checkpoint_is_reported() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let path = store.save(&uninterrupted().snapshot(), "tok").unwrap();

    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, &content[..content.len() / 2]).unwrap();

    let err = store.load("tok").unwrap_err();
    assert!(matches!(err, CheckpointError::Serialization { .. }));
    assert!(!matches!(err, CheckpointError::NoSuchCheckpoint));
}

#[test]
fn test_overwrite_keeps_latest() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());

    let empty = ScanState::new("sha1Hash", vec!["root".into()], Default::default());
    store.save(&empty, "tok").unwrap();
    let full = uninterrupted().snapshot();
    store.save(&full, "tok").unwrap();

    assert_eq!(store.load("tok").unwrap(), full);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers.len(), 1, "{leftovers:?}");
}
