use clap::Parser;
use drivedupe::checkpoint::{CheckpointError, CheckpointStore, ScanState};
use drivedupe::cli::Cli;
use drivedupe::error::ExitCode;
use drivedupe::remote::{DriveSnapshot, SnapshotEntry};
use tempfile::{tempdir, TempDir};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(duplicates: bool) -> Self {
        let dir = tempdir().unwrap();
        let second = if duplicates { "SAME" } else { "OTHER" };
        let snapshot = DriveSnapshot::new(
            "root",
            vec![
                SnapshotEntry::folder("music", "Music", "root"),
                SnapshotEntry::file("s1", "song.mp3", "music", 4000)
                    .with_hash("sha1Hash", "SAME"),
                SnapshotEntry::file("s2", "song (1).mp3", "root", 4000)
                    .with_hash("sha1Hash", second),
            ],
        );
        snapshot.save(&dir.path().join("drive.json")).unwrap();
        Self { dir }
    }

    fn checkpoints(&self) -> std::path::PathBuf {
        self.dir.path().join("checkpoints")
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let snapshot = self.dir.path().join("drive.json");
        let checkpoints = self.checkpoints();
        let mut argv = vec![
            "drivedupe".to_string(),
            "-q".to_string(),
            "--checkpoint-dir".to_string(),
            checkpoints.to_string_lossy().into_owned(),
        ];
        let snapshot = snapshot.to_string_lossy();
        argv.extend(args.iter().map(|a| a.replace("{snapshot}", &snapshot)));
        drivedupe::run_app(Cli::try_parse_from(argv).unwrap())
    }

    fn scan(&self, token: &str, extra: &[&str]) -> anyhow::Result<ExitCode> {
        let mut args = vec!["scan", "--token", token, "--snapshot", "{snapshot}"];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

#[test]
fn test_scan_completes_with_duplicates() {
    let fx = Fixture::new(true);
    let code = fx.scan("t1", &["--output", "json"]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let state = CheckpointStore::new(fx.checkpoints()).load("t1").unwrap();
    assert!(state.is_complete());
    assert_eq!(state.stats().files_scanned, 2);
}

#[test]
fn test_scan_without_duplicates() {
    let fx = Fixture::new(false);
    let code = fx.scan("t1", &[]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_status_and_discard() {
    let fx = Fixture::new(true);
    fx.scan("t1", &[]).unwrap();

    assert_eq!(fx.run(&["status", "--token", "t1"]).unwrap(), ExitCode::Success);
    assert_eq!(fx.run(&["discard", "--token", "t1"]).unwrap(), ExitCode::Success);

    let err = fx.run(&["status", "--token", "t1"]).unwrap_err();
    assert!(err.chain().any(|c| matches!(
        c.downcast_ref::<CheckpointError>(),
        Some(CheckpointError::NoSuchCheckpoint)
    )));
}

#[test]
fn test_status_of_partial_scan_is_incomplete() {
    let fx = Fixture::new(true);
    let store = CheckpointStore::new(fx.checkpoints());
    store
        .save(&ScanState::new("sha1Hash", vec!["music".into()], Default::default()), "t2")
        .unwrap();

    assert_eq!(fx.run(&["status", "--token", "t2"]).unwrap(), ExitCode::Incomplete);
}

#[test]
fn test_scan_resumes_saved_progress() {
    let fx = Fixture::new(true);
    // Pretend an earlier run already listed the root and recorded nothing else
    let store = CheckpointStore::new(fx.checkpoints());
    store
        .save(&ScanState::new("sha1Hash", vec!["music".into()], Default::default()), "t3")
        .unwrap();

    let code = fx.scan("t3", &[]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    let code = fx.scan("t3", &["--fresh"]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_tokens_do_not_share_progress() {
    let fx = Fixture::new(true);
    fx.scan("alice", &[]).unwrap();
    let store = CheckpointStore::new(fx.checkpoints());
    assert!(store.exists("alice"));
    assert!(!store.exists("bob"));
}

#[test]
fn test_missing_snapshot_is_general_error() {
    let fx = Fixture::new(true);
    let err = fx
        .run(&["scan", "--token", "t", "--snapshot", "/nonexistent/drive.json"])
        .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    let message = format!("{err:#}");
    assert!(message.contains("Failed to read drive snapshot"));
    assert!(!CheckpointStore::new(fx.checkpoints()).exists("t"));
}
