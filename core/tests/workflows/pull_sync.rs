// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Pulling remote changes into the SQLite state database.

use std::sync::Arc;

use calsync_core::localdb::LocalDb;
use calsync_core::{
    CheckResult, ReconcileMode, SyncCursor, SyncCursorStore, SyncDelta, SyncKind, SyncLane,
    SyncReconciler, Todo,
};

use crate::common::{ScriptedQueryGateway, setup_temp_state, todo};

#[tokio::test]
async fn workflow_pull_resumes_from_persisted_cursor() {
    // Arrange
    let state = setup_temp_state().await.unwrap();
    let db = LocalDb::open(Some(&state.db_path())).await.unwrap();
    let remote = Arc::new(ScriptedQueryGateway::new());
    remote.respond(SyncDelta {
        created: Some(vec![todo("t1", "one"), todo("t2", "two")]),
        updated: None,
        deleted_ids: None,
        check_result: CheckResult::DeltaAvailable,
        new_cursor: Some(SyncCursor::new(SyncKind::Todo, 1_000)),
    });
    let reconciler = SyncReconciler::new(Arc::new(db.sync_cursors.clone())).with_todos(
        SyncLane::<Todo>::new(remote.clone(), Arc::new(db.entities::<Todo>())),
    );
    reconciler
        .reconcile_todos(ReconcileMode::Incremental)
        .await
        .unwrap();
    db.close().await.unwrap();

    // Act: a new process continues where the last one stopped
    let db = LocalDb::open(Some(&state.db_path())).await.unwrap();
    let remote = Arc::new(ScriptedQueryGateway::new());
    remote.respond(SyncDelta {
        created: None,
        updated: Some(vec![todo("t2", "two, edited")]),
        deleted_ids: Some(vec!["t1".to_string()]),
        check_result: CheckResult::DeltaAvailable,
        new_cursor: Some(SyncCursor::new(SyncKind::Todo, 2_000)),
    });
    let reconciler = SyncReconciler::new(Arc::new(db.sync_cursors.clone())).with_todos(
        SyncLane::<Todo>::new(remote.clone(), Arc::new(db.entities::<Todo>())),
    );
    reconciler
        .reconcile_todos(ReconcileMode::Incremental)
        .await
        .unwrap();

    // Assert
    assert_eq!(
        remote.requests(),
        vec![(Some(SyncCursor::new(SyncKind::Todo, 1_000)), false)]
    );
    assert_eq!(
        db.entities::<Todo>().list().await.unwrap(),
        vec![todo("t2", "two, edited")]
    );
    assert_eq!(
        db.sync_cursors.load(SyncKind::Todo).await.unwrap(),
        Some(SyncCursor::new(SyncKind::Todo, 2_000))
    );
}

#[tokio::test]
async fn workflow_pull_in_memory_database() {
    // Arrange
    let db = LocalDb::open(None).await.unwrap();
    let remote = Arc::new(ScriptedQueryGateway::new());
    remote.respond(SyncDelta {
        created: None,
        updated: Some(vec![todo("t1", "kept")]),
        deleted_ids: None,
        check_result: CheckResult::FullResyncRequired,
        new_cursor: Some(SyncCursor::new(SyncKind::Todo, 5)),
    });
    let reconciler = SyncReconciler::new(Arc::new(db.sync_cursors.clone())).with_todos(
        SyncLane::<Todo>::new(remote, Arc::new(db.entities::<Todo>())),
    );

    // Act
    let applied = reconciler
        .reconcile(SyncKind::Todo, ReconcileMode::Full)
        .await
        .unwrap();

    // Assert
    assert_eq!(applied.applied(), (1, 0));
    assert_eq!(db.sync_cursors.list().await.unwrap().len(), 1);
    assert_eq!(
        db.entities::<Todo>().list().await.unwrap(),
        vec![todo("t1", "kept")]
    );
}
