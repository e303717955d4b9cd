// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Kind routing and multi-kind reconciliation.

use std::sync::Arc;

use calsync_core::memory::MemoryCursorStore;
use calsync_core::{
    CheckResult, DataKind, ReconcileMode, ReconciledDelta, SyncCursor, SyncCursorStore, SyncDelta,
    SyncError, SyncKind, SyncReconciler,
};

use super::Harness;
use crate::common::{schedule, tag, todo};

fn cursor(kind: SyncKind, ts: i64) -> Option<SyncCursor> {
    Some(SyncCursor::new(kind, ts))
}

#[tokio::test]
async fn routing_dispatches_by_kind() {
    // Arrange
    let harness = Harness::new();
    harness.schedule_remote.respond(SyncDelta {
        created: Some(vec![schedule("s1", "standup")]),
        updated: None,
        deleted_ids: None,
        check_result: CheckResult::DeltaAvailable,
        new_cursor: cursor(SyncKind::Schedule, 4),
    });

    // Act
    let applied = harness
        .reconciler
        .reconcile(SyncKind::Schedule, ReconcileMode::Incremental)
        .await
        .unwrap();

    // Assert
    assert_eq!(applied.kind(), SyncKind::Schedule);
    assert_eq!(applied.applied(), (1, 0));
    assert_eq!(applied.new_cursor(), cursor(SyncKind::Schedule, 4));
    assert_eq!(
        harness.schedules.snapshot().await,
        vec![schedule("s1", "standup")]
    );
    assert!(harness.tag_remote.requests().is_empty());
    assert!(harness.todo_remote.requests().is_empty());
}

#[tokio::test]
async fn routing_all_runs_tags_todos_schedules_in_order() {
    // Arrange
    let harness = Harness::new();
    harness.tag_remote.respond(SyncDelta {
        created: Some(vec![tag("g1", "work")]),
        updated: None,
        deleted_ids: None,
        check_result: CheckResult::DeltaAvailable,
        new_cursor: cursor(SyncKind::Tag, 1),
    });
    harness.todo_remote.respond(SyncDelta {
        created: Some(vec![todo("t1", "write report")]),
        updated: None,
        deleted_ids: None,
        check_result: CheckResult::DeltaAvailable,
        new_cursor: cursor(SyncKind::Todo, 2),
    });

    // Act
    let applied = harness
        .reconciler
        .reconcile_all(ReconcileMode::Incremental)
        .await
        .unwrap();

    // Assert
    let kinds: Vec<_> = applied.iter().map(ReconciledDelta::kind).collect();
    assert_eq!(kinds, SyncKind::ALL.to_vec());
    let results: Vec<_> = applied.iter().map(ReconciledDelta::check_result).collect();
    assert_eq!(
        results,
        vec![
            CheckResult::DeltaAvailable,
            CheckResult::DeltaAvailable,
            CheckResult::NoChangeNeeded,
        ]
    );
    assert_eq!(harness.tags.snapshot().await, vec![tag("g1", "work")]);
    assert_eq!(harness.todos.snapshot().await, vec![todo("t1", "write report")]);
    assert_eq!(
        harness.cursors.load(SyncKind::Todo).await.unwrap(),
        cursor(SyncKind::Todo, 2)
    );
    assert!(harness.cursors.load(SyncKind::Schedule).await.unwrap().is_none());
}

#[tokio::test]
async fn routing_all_stops_at_first_failure() {
    // Arrange
    let harness = Harness::new();
    harness
        .todo_remote
        .fail(SyncError::remote_fatal("unauthorized"));

    // Act
    let result = harness
        .reconciler
        .reconcile_all(ReconcileMode::Full)
        .await;

    // Assert: tags ran, schedules never asked
    assert!(matches!(result, Err(SyncError::Remote { retryable: false, .. })));
    assert_eq!(harness.tag_remote.requests(), vec![(None, true)]);
    assert_eq!(harness.todo_remote.requests(), vec![(None, true)]);
    assert!(harness.schedule_remote.requests().is_empty());
}

#[tokio::test]
async fn routing_missing_lane_is_unsupported() {
    // Arrange
    let cursors = Arc::new(MemoryCursorStore::new());
    let reconciler = SyncReconciler::new(cursors.clone());

    // Act
    let result = reconciler
        .reconcile(SyncKind::Tag, ReconcileMode::Incremental)
        .await;

    // Assert
    assert!(matches!(result, Err(SyncError::Unsupported(DataKind::Tag))));
    assert!(cursors.load(SyncKind::Tag).await.unwrap().is_none());
}
