use scorm_trackstore::{
    CommitAction, ElementSnapshot, FsTrackingStore, MemoryTrackingStore, TrackingKey,
    TrackingStore, TrackingStoreError, TrackingStoreResult, UpsertRequest,
};

fn upsert_request(
    session_id: &str,
    sequence_no: u64,
    action: CommitAction,
    elements: &[(&str, &str)],
) -> UpsertRequest {
    UpsertRequest {
        key: TrackingKey::new("enr-42", "sco-intro"),
        session_id: session_id.to_string(),
        sequence_no,
        action,
        snapshot: elements
            .iter()
            .map(|(path, value)| (path.to_string(), value.to_string()))
            .collect::<ElementSnapshot>(),
    }
}

async fn exercise_idempotent_upsert<T: TrackingStore>(store: &T) -> TrackingStoreResult<()> {
    let request = upsert_request(
        "session-a",
        1,
        CommitAction::Commit,
        &[("cmi.core.lesson_status", "incomplete")],
    );
    let first = store.upsert(request.clone()).await?;
    let second = store.upsert(request).await?;
    assert!(first.applied);
    assert!(!second.applied);

    let state = store
        .load(&TrackingKey::new("enr-42", "sco-intro"))
        .await?
        .expect("state should exist after upsert");
    assert_eq!(state.commit_count, 1);
    assert_eq!(state.last_sequence_no, 1);
    Ok(())
}

async fn exercise_session_history<T: TrackingStore>(store: &T) -> TrackingStoreResult<()> {
    store
        .upsert(upsert_request(
            "session-a",
            1,
            CommitAction::Commit,
            &[
                ("cmi.core.lesson_location", "page-4"),
                ("cmi.suspend_data", "a=1"),
            ],
        ))
        .await?;
    store
        .upsert(upsert_request(
            "session-a",
            2,
            CommitAction::Terminate,
            &[("cmi.core.exit", "suspend")],
        ))
        .await?;

    let key = TrackingKey::new("enr-42", "sco-intro");
    let after_first = store.load(&key).await?.expect("state should exist");
    assert!(after_first.terminated);
    assert!(!after_first.can_resume());

    // A fresh session restarts its sequence numbers without colliding.
    store
        .upsert(upsert_request(
            "session-b",
            1,
            CommitAction::Commit,
            &[("cmi.core.lesson_location", "page-5")],
        ))
        .await?;
    let after_second = store.load(&key).await?.expect("state should exist");
    assert_eq!(after_second.elements["cmi.core.lesson_location"], "page-5");
    assert_eq!(after_second.elements["cmi.suspend_data"], "a=1");
    assert_eq!(after_second.last_session_id.as_deref(), Some("session-b"));
    assert_eq!(after_second.commit_count, 3);
    assert!(after_second.can_resume());
    Ok(())
}

async fn exercise_conflicting_redelivery<T: TrackingStore>(store: &T) -> TrackingStoreResult<()> {
    store
        .upsert(upsert_request(
            "session-a",
            1,
            CommitAction::Commit,
            &[("cmi.core.score.raw", "40")],
        ))
        .await?;
    let error = store
        .upsert(upsert_request(
            "session-a",
            1,
            CommitAction::Commit,
            &[("cmi.core.score.raw", "90")],
        ))
        .await
        .expect_err("same sequence with different content should conflict");
    assert!(matches!(error, TrackingStoreError::Conflict(_)));
    assert!(!error.is_retryable());
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn memory_store_idempotent_upsert_expected_single_application() {
    let store = MemoryTrackingStore::new();
    exercise_idempotent_upsert(&store)
        .await
        .expect("memory idempotent upsert should succeed");
}

#[tokio::test(flavor = "current_thread")]
async fn fs_store_idempotent_upsert_expected_single_application() {
    let tmp = tempfile::tempdir().expect("tempdir should be created");
    let store = FsTrackingStore::new(tmp.path()).expect("fs store should initialize");
    exercise_idempotent_upsert(&store)
        .await
        .expect("fs idempotent upsert should succeed");
}

#[tokio::test(flavor = "current_thread")]
async fn memory_and_fs_session_history_expected_same_behavior() {
    let memory = MemoryTrackingStore::new();
    exercise_session_history(&memory)
        .await
        .expect("memory session history should succeed");

    let tmp = tempfile::tempdir().expect("tempdir should be created");
    let fs = FsTrackingStore::new(tmp.path()).expect("fs store should initialize");
    exercise_session_history(&fs)
        .await
        .expect("fs session history should succeed");
}

#[tokio::test(flavor = "current_thread")]
async fn memory_and_fs_conflicting_redelivery_expected_same_behavior() {
    let memory = MemoryTrackingStore::new();
    exercise_conflicting_redelivery(&memory)
        .await
        .expect("memory conflict check should succeed");

    let tmp = tempfile::tempdir().expect("tempdir should be created");
    let fs = FsTrackingStore::new(tmp.path()).expect("fs store should initialize");
    exercise_conflicting_redelivery(&fs)
        .await
        .expect("fs conflict check should succeed");
}
