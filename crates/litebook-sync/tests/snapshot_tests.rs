// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavior of single sync attempts against an on-disk layout.

use std::sync::Arc;
use std::time::Duration;

use litebook_core::{CheckpointMode, LitebookError};
use litebook_storage::{LocalStore, hash_file};
use litebook_sync::{SnapshotService, SyncOutcome};
use litebook_test_utils::{
    CountingMirror, FailingMirror, HookEvent, RecordingHooks, SlowMirror, TestLayout,
};
use tracing_test::traced_test;

fn uploaded_hash(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Uploaded { hash, .. } => hash.clone(),
        other => panic!("expected an upload, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_sync_uploads_and_records_hash() {
    let layout = TestLayout::new();
    layout.write_rows(3);
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    let outcome = service.sync_once(CheckpointMode::Passive, false).await;
    let hash = uploaded_hash(&outcome);

    assert_eq!(layout.stored_checksum().as_deref(), Some(hash.as_str()));
    assert_eq!(hash_file(&layout.remote_path()).unwrap(), hash);
    assert_eq!(TestLayout::count_rows(&layout.remote_path()), 3);
    assert!(!service.is_finalized());
}

#[tokio::test]
#[traced_test]
async fn garbled_baseline_is_replaced_by_an_upload() {
    let layout = TestLayout::new();
    layout.write_rows(2);
    std::fs::write(layout.checksum_path(), "€€€€€€€€€€\n").unwrap();
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    let outcome = service.sync_once(CheckpointMode::Passive, false).await;
    let hash = uploaded_hash(&outcome);

    assert_eq!(layout.stored_checksum().as_deref(), Some(hash.as_str()));
    assert!(logs_contain("not a hex digest"));
    assert!(logs_contain("previous=none"));
}

#[tokio::test]
#[traced_test]
async fn unremovable_snapshot_is_reported_once() {
    let mut layout = TestLayout::new();
    layout.write_rows(1);
    // A non-empty directory where the snapshot belongs: the copy fails and
    // so does the cleanup.
    let blocker = layout.root().join("blocked.snap");
    std::fs::create_dir_all(blocker.join("inner")).unwrap();
    layout.config_mut().sync.snapshot_path = Some(blocker.display().to_string());
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    let outcome = service.sync_once(CheckpointMode::Passive, false).await;

    assert!(outcome.is_failure());
    assert!(blocker.is_dir());
    logs_assert(|lines: &[&str]| {
        match lines
            .iter()
            .filter(|line| line.contains("could not remove snapshot file"))
            .count()
        {
            1 => Ok(()),
            n => Err(format!("expected one cleanup warning, saw {n}")),
        }
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unchanged_content_skips_upload() {
    let layout = TestLayout::new();
    layout.write_rows(3);
    let mirror = Arc::new(CountingMirror::fs(layout.remote_path()));
    let service = SnapshotService::new(layout.config(), mirror.clone());

    let first = service.sync_once(CheckpointMode::Passive, false).await;
    assert!(first.did_upload());
    let second = service.sync_once(CheckpointMode::Passive, false).await;

    assert_eq!(
        second,
        SyncOutcome::Unchanged {
            hash: uploaded_hash(&first)
        }
    );
    assert!(!second.did_upload());
    assert_eq!(mirror.pushes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn changed_content_replaces_baseline() {
    let layout = TestLayout::new();
    layout.write_rows(3);
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    let h1 = uploaded_hash(&service.sync_once(CheckpointMode::Passive, false).await);
    layout.write_rows(2);
    let h2 = uploaded_hash(&service.sync_once(CheckpointMode::Passive, false).await);

    assert_ne!(h1, h2);
    assert_eq!(layout.stored_checksum().as_deref(), Some(h2.as_str()));
    assert_eq!(hash_file(&layout.remote_path()).unwrap(), h2);
    assert_eq!(TestLayout::count_rows(&layout.remote_path()), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_finalize_is_skipped() {
    let layout = TestLayout::new();
    layout.write_rows(1);
    let mirror = Arc::new(CountingMirror::fs(layout.remote_path()));
    let service = SnapshotService::new(layout.config(), mirror.clone());

    let first = service.sync_once(CheckpointMode::Truncate, true).await;
    assert!(first.did_upload());
    assert!(service.is_finalized());

    layout.write_rows(1);
    let second = service.sync_once(CheckpointMode::Truncate, true).await;
    assert_eq!(second, SyncOutcome::AlreadyFinalized);
    assert_eq!(mirror.pushes(), 1);

    // Non-finalizing syncs still run after the latch.
    let third = service.sync_once(CheckpointMode::Passive, false).await;
    assert!(third.did_upload());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn finalize_with_unchanged_content_still_latches() {
    let layout = TestLayout::new();
    layout.write_rows(1);
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    service.sync_once(CheckpointMode::Passive, false).await;
    let outcome = service.sync_once(CheckpointMode::Truncate, true).await;
    assert!(matches!(outcome, SyncOutcome::Unchanged { .. }));
    assert!(service.is_finalized());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_local_file_is_a_quiet_skip() {
    let layout = TestLayout::new();
    let mirror = Arc::new(CountingMirror::fs(layout.remote_path()));
    let service = SnapshotService::new(layout.config(), mirror.clone());

    assert_eq!(
        service.sync_once(CheckpointMode::Passive, false).await,
        SyncOutcome::NoLocalFile
    );
    assert_eq!(
        service.sync_once(CheckpointMode::Truncate, true).await,
        SyncOutcome::NoLocalFile
    );
    assert!(!service.is_finalized());
    assert_eq!(mirror.pushes(), 0);
    assert!(!layout.snapshot_path().exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upload_failure_keeps_baseline_and_does_not_latch() {
    let layout = TestLayout::new();
    layout.write_rows(2);
    std::fs::write(layout.checksum_path(), "previous\n").unwrap();
    let service = SnapshotService::new(
        layout.config(),
        Arc::new(FailingMirror::new(layout.remote_path())),
    );

    let outcome = service.sync_once(CheckpointMode::Truncate, true).await;
    assert!(outcome.is_failure(), "got {outcome:?}");
    assert!(!service.is_finalized());
    assert_eq!(layout.stored_checksum().as_deref(), Some("previous"));
    assert!(!layout.remote_path().exists());
    assert!(!layout.snapshot_path().exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_mount_fails_without_creating_it() {
    let layout = TestLayout::without_mount();
    layout.write_rows(1);
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    let outcome = service.sync_once(CheckpointMode::Passive, false).await;
    match outcome {
        SyncOutcome::Failed { reason } => {
            let expected = LitebookError::MissingRemoteMount {
                path: layout.mount_dir(),
            };
            assert_eq!(reason, expected.to_string());
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!layout.mount_dir().exists());
    assert_eq!(layout.stored_checksum(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshot_file_never_outlives_an_attempt() {
    let layout = TestLayout::new();
    layout.write_rows(1);
    let ok = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));
    let failing = SnapshotService::new(
        layout.config(),
        Arc::new(FailingMirror::new(layout.remote_path())),
    );

    ok.sync_once(CheckpointMode::Passive, false).await;
    assert!(!layout.snapshot_path().exists());
    ok.sync_once(CheckpointMode::Passive, false).await;
    assert!(!layout.snapshot_path().exists());
    layout.write_rows(1);
    failing.sync_once(CheckpointMode::Passive, false).await;
    assert!(!layout.snapshot_path().exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_snapshot_from_a_crash_is_replaced() {
    let layout = TestLayout::new();
    layout.write_rows(2);
    std::fs::write(layout.snapshot_path(), b"garbage from a previous run").unwrap();
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    let hash = uploaded_hash(&service.sync_once(CheckpointMode::Passive, false).await);
    assert_eq!(hash_file(&layout.remote_path()).unwrap(), hash);
    assert_eq!(TestLayout::count_rows(&layout.remote_path()), 2);
    assert!(!layout.snapshot_path().exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn writers_are_paused_only_around_the_checkpoint() {
    let layout = TestLayout::new();
    layout.write_rows(2);
    let delay = Duration::from_millis(400);
    let hooks = Arc::new(RecordingHooks::new());
    let mirror = Arc::new(SlowMirror::new(layout.remote_path(), delay));
    let service =
        SnapshotService::new(layout.config(), mirror.clone()).with_hooks(hooks.clone());

    let outcome = service.sync_once(CheckpointMode::Truncate, false).await;
    assert!(outcome.did_upload());

    assert_eq!(hooks.kinds(), vec![HookEvent::Pause, HookEvent::Resume]);
    let paused = hooks.last(HookEvent::Pause).unwrap();
    let resumed = hooks.last(HookEvent::Resume).unwrap();
    let push_started = mirror.push_starts()[0];

    assert!(resumed <= push_started, "writers resumed after the upload began");
    assert!(
        resumed - paused < delay,
        "pause window {:?} should be shorter than the upload",
        resumed - paused
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_proceed_during_a_slow_upload() {
    let layout = TestLayout::new();
    layout.write_rows(1);
    let store = Arc::new(LocalStore::new(
        layout.local_path(),
        layout.config().storage.clone(),
    ));
    store.open().await.unwrap();

    let delay = Duration::from_millis(800);
    let mirror = Arc::new(SlowMirror::new(layout.remote_path(), delay));
    let service = Arc::new(
        SnapshotService::new(layout.config(), mirror.clone()).with_hooks(store.clone()),
    );

    let sync = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.sync_once(CheckpointMode::Passive, false).await })
    };

    // Wait until the upload has started.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while mirror.push_starts().is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "upload never started");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let started = tokio::time::Instant::now();
    let session = tokio::time::timeout(Duration::from_secs(1), store.acquire_session())
        .await
        .expect("session blocked during upload")
        .unwrap();
    session
        .connection()
        .call(|conn| -> Result<usize, rusqlite::Error> {
            conn.execute("INSERT INTO notes (body) VALUES ('during upload')", [])
        })
        .await
        .unwrap();
    assert!(started.elapsed() < delay);
    drop(session);

    assert!(sync.await.unwrap().did_upload());
    assert!(store.gate().is_open());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_pause_still_resumes() {
    let layout = TestLayout::new();
    layout.write_rows(1);
    let hooks = Arc::new(RecordingHooks::failing_pause());
    let service =
        SnapshotService::new(layout.config(), Arc::new(layout.mirror())).with_hooks(hooks.clone());

    let outcome = service.sync_once(CheckpointMode::Passive, false).await;
    assert!(outcome.did_upload());
    assert_eq!(hooks.kinds(), vec![HookEvent::Pause, HookEvent::Resume]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pausing_can_be_disabled() {
    let mut layout = TestLayout::new();
    layout.config_mut().sync.pause_writes = false;
    layout.write_rows(1);
    let hooks = Arc::new(RecordingHooks::new());
    let service =
        SnapshotService::new(layout.config(), Arc::new(layout.mirror())).with_hooks(hooks.clone());

    assert!(service.sync_once(CheckpointMode::Passive, false).await.did_upload());
    assert!(hooks.kinds().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn checkpoint_failure_does_not_stop_the_upload() {
    let layout = TestLayout::new();
    // Not a database: the checkpoint fails, the bytes are still mirrored.
    std::fs::write(layout.local_path(), b"plain bytes").unwrap();
    let service = SnapshotService::new(layout.config(), Arc::new(layout.mirror()));

    let outcome = service.sync_once(CheckpointMode::Truncate, false).await;
    assert!(outcome.did_upload(), "got {outcome:?}");
    assert_eq!(std::fs::read(layout.remote_path()).unwrap(), b"plain bytes");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_attempts_are_serialized() {
    let layout = TestLayout::new();
    layout.write_rows(2);
    let mirror = Arc::new(SlowMirror::new(
        layout.remote_path(),
        Duration::from_millis(200),
    ));
    let service = Arc::new(SnapshotService::new(layout.config(), mirror.clone()));

    let a = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.sync_once(CheckpointMode::Passive, false).await })
    };
    let b = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.sync_once(CheckpointMode::Passive, false).await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let uploads = [&a, &b].iter().filter(|o| o.did_upload()).count();
    assert_eq!(uploads, 1, "outcomes: {a:?} / {b:?}");
    assert_eq!(mirror.push_starts().len(), 1);
}
