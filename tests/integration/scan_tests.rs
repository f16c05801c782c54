use drivedupe::item::Item;
use drivedupe::remote::{
    DriveSnapshot, FolderHandle, PageSink, RemoteError, RemoteTreeAdapter, SnapshotAdapter,
    SnapshotEntry,
};
use drivedupe::scan::{ScanCoordinator, ScanError, ScanOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// root
/// ├── Photos (a.jpg, b.jpg, Trip (c.jpg, d.jpg), Empty)
/// ├── Docs (report.pdf, copy.pdf, notes.txt)
/// └── readme.md
fn sample_drive() -> DriveSnapshot {
    DriveSnapshot::new(
        "root",
        vec![
            SnapshotEntry::folder("photos", "Photos", "root"),
            SnapshotEntry::folder("docs", "Docs", "root"),
            SnapshotEntry::file("readme", "readme.md", "root", 120)
                .with_hash("sha1Hash", "R"),
            SnapshotEntry::file("a", "a.jpg", "photos", 1000)
                .with_hash("sha1Hash", "P1"),
            SnapshotEntry::file("b", "b.jpg", "photos", 1000)
                .with_hash("sha1Hash", "P1"),
            SnapshotEntry::folder("trip", "Trip", "photos"),
            SnapshotEntry::folder("empty", "Empty", "photos"),
            SnapshotEntry::file("c", "c.jpg", "trip", 1000)
                .with_hash("sha1Hash", "P1"),
            SnapshotEntry::file("d", "d.jpg", "trip", 300)
                .with_hash("sha1Hash", "P2"),
            SnapshotEntry::file("report", "report.pdf", "docs", 50)
                .with_hash("sha1Hash", "D"),
            SnapshotEntry::file("copy", "copy.pdf", "docs", 50)
                .with_hash("sha1Hash", "D"),
            SnapshotEntry::file("notes", "notes.txt", "docs", 7),
        ],
    )
}

fn run_to_completion<A: RemoteTreeAdapter>(scan: &ScanCoordinator<A>) {
    let mut steps = 0;
    while !scan.is_complete() {
        scan.advance().unwrap();
        steps += 1;
        assert!(steps < 1000, "scan did not converge");
    }
}

/// Wraps an adapter and counts listings per handle.
struct Counting<A> {
    inner: A,
    listings: Mutex<HashMap<String, usize>>,
}

impl<A> Counting<A> {
    fn new(inner: A) -> Self {
        Self {
            inner,
            listings: Mutex::new(HashMap::new()),
        }
    }
}

impl<A: RemoteTreeAdapter> RemoteTreeAdapter for Counting<A> {
    fn list_children(
        &self,
        handle: &FolderHandle,
        sink: &mut PageSink,
    ) -> Result<Vec<Item>, RemoteError> {
        *self
            .listings
            .lock()
            .unwrap()
            .entry(handle.to_string())
            .or_default() += 1;
        self.inner.list_children(handle, sink)
    }

    fn handle_for(&self, folder_id: &str) -> FolderHandle {
        self.inner.handle_for(folder_id)
    }
}

#[test]
fn test_full_scan_of_snapshot() {
    let adapter = SnapshotAdapter::new(sample_drive());
    let root = adapter.root_handle();
    let scan = ScanCoordinator::new("sha1Hash", adapter);
    scan.seed(root);
    run_to_completion(&scan);

    let stats = scan.stats();
    assert_eq!(stats.folders_discovered, 4);
    assert_eq!(stats.files_scanned, 8);
    assert_eq!(stats.bytes_scanned, 120 + 1000 * 3 + 300 + 50 * 2 + 7);

    let groups = scan.duplicates();
    assert_eq!(groups.len(), 2);
    // Largest waste first
    assert_eq!(groups[0].hash, "P1");
    assert_eq!(groups[0].ids(), vec!["a", "b", "c"]);
    assert_eq!(groups[1].hash, "D");
    assert_eq!(groups[1].ids(), vec!["copy", "report"]);
}

#[test]
fn test_files_carry_location() {
    let adapter = SnapshotAdapter::new(sample_drive());
    let root = adapter.root_handle();
    let scan = ScanCoordinator::new("sha1Hash", adapter);
    scan.seed(root);
    run_to_completion(&scan);

    let groups = scan.duplicates();
    let c = groups[0].files.iter().find(|f| f.id() == "c").unwrap();
    assert_eq!(c.meta.parent_id, "trip");
    assert_eq!(c.meta.parent_path, "/root/Photos/Trip");
}

#[test]
fn test_pagination_lists_every_page_once() {
    let adapter = Counting::new(SnapshotAdapter::new(sample_drive()).with_page_size(2));
    let root = adapter.inner.root_handle();
    let scan = ScanCoordinator::new("sha1Hash", adapter);
    scan.seed(root);
    run_to_completion(&scan);

    assert_eq!(scan.stats().files_scanned, 8);
    assert_eq!(scan.stats().folders_discovered, 4);
    assert_eq!(scan.duplicates().len(), 2);

    let listings = scan.adapter().listings.lock().unwrap();
    assert!(listings.values().all(|&n| n == 1), "{listings:?}");
    // root: 3 children -> 2 pages; photos: 4 -> 2; trip: 2 -> 1; docs: 3 -> 2
    assert_eq!(listings.len(), 7);
    assert!(!listings.contains_key("empty"));
}

#[test]
fn test_single_task_per_step_matches_wide_steps() {
    let narrow = {
        let adapter = SnapshotAdapter::new(sample_drive());
        let root = adapter.root_handle();
        let options = ScanOptions::default()
            .with_tasks_per_advance(1)
            .with_worker_threads(1);
        let scan = ScanCoordinator::with_options("sha1Hash", adapter, options);
        scan.seed(root);
        run_to_completion(&scan);
        scan.report()
    };
    let wide = {
        let adapter = SnapshotAdapter::new(sample_drive());
        let root = adapter.root_handle();
        let scan = ScanCoordinator::new("sha1Hash", adapter);
        scan.seed(root);
        run_to_completion(&scan);
        scan.report()
    };
    assert_eq!(narrow, wide);
}

#[test]
fn test_revoked_credentials_surface_and_scan_resumes() {
    let adapter = Arc::new(SnapshotAdapter::new(sample_drive()));
    let root = adapter.root_handle();
    let options = ScanOptions::default().with_tasks_per_advance(1);
    let scan = ScanCoordinator::with_options("sha1Hash", Arc::clone(&adapter), options);
    scan.seed(root);

    scan.advance().unwrap();
    let before = scan.snapshot();

    adapter.revoke();
    let err = scan.advance().unwrap_err();
    assert!(err.is_unauthorized());

    let after = scan.snapshot();
    assert_eq!(after.accumulator, before.accumulator);
    let mut pending = after.pending.clone();
    pending.sort();
    let mut expected = before.pending.clone();
    expected.sort();
    assert_eq!(pending, expected);

    adapter.restore();
    run_to_completion(&scan);
    assert_eq!(scan.stats().files_scanned, 8);
    assert_eq!(scan.duplicates().len(), 2);
}

#[test]
fn test_unclassified_item_aborts_listing() {
    let json = r#"{
        "rootId": "root",
        "items": [
            { "id": "ok", "name": "ok.txt", "size": 1, "parentId": "root", "file": {} },
            { "id": "odd", "name": "package", "parentId": "root" }
        ]
    }"#;
    let snapshot: DriveSnapshot = serde_json::from_str(json).unwrap();
    let adapter = SnapshotAdapter::new(snapshot);
    let root = adapter.root_handle();
    let options = ScanOptions::default().with_requeue_failed(false);
    let scan = ScanCoordinator::with_options("sha1Hash", adapter, options);
    scan.seed(root);

    let err = scan.advance().unwrap_err();
    match err.remote_error() {
        Some(RemoteError::UnclassifiedItem { id, raw_response }) => {
            assert_eq!(id, "odd");
            assert!(raw_response.contains("package"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Nothing from the aborted listing was recorded
    assert_eq!(scan.stats().files_scanned, 0);
}

#[test]
fn test_missing_child_count_is_protocol_error() {
    let json = r#"{
        "rootId": "root",
        "items": [
            { "id": "f", "name": "Folder", "parentId": "root", "folder": {} }
        ]
    }"#;
    let snapshot: DriveSnapshot = serde_json::from_str(json).unwrap();
    let adapter = SnapshotAdapter::new(snapshot);
    let root = adapter.root_handle();
    let scan = ScanCoordinator::new("sha1Hash", adapter);
    scan.seed(root);

    let err = scan.advance().unwrap_err();
    assert!(matches!(err, ScanError::Remote { other_failures: 0, .. }));
    match err.remote_error() {
        Some(RemoteError::Protocol {
            missing_field,
            raw_response,
        }) => {
            assert_eq!(missing_field, "childCount");
            assert!(raw_response.contains("\"id\":\"f\""));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Requeued for a later attempt, once
    assert_eq!(scan.pending(), 1);
}
