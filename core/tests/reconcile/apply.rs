// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! How each check result is applied to the local store.

use calsync_core::memory::MemoryEntityStore;
use calsync_core::{CheckResult, ReconcileMode, SyncCursor, SyncDelta, SyncKind, Todo};

use super::Harness;
use crate::common::todo;

fn delta(
    check_result: CheckResult,
    created: Option<Vec<Todo>>,
    updated: Option<Vec<Todo>>,
    deleted: Option<Vec<&str>>,
    cursor: Option<i64>,
) -> SyncDelta<Todo> {
    SyncDelta {
        created,
        updated,
        deleted_ids: deleted.map(|ids| ids.into_iter().map(String::from).collect()),
        check_result,
        new_cursor: cursor.map(|ts| SyncCursor::new(SyncKind::Todo, ts)),
    }
}

#[tokio::test]
async fn apply_delta_merges_created_and_updated() {
    // Arrange: the local cache already holds a stale copy of something reported as created
    let harness = Harness::with_todos(MemoryEntityStore::with_entities([
        todo("t1", "stale"),
        todo("t9", "untouched"),
    ]));
    harness.todo_remote.respond(delta(
        CheckResult::DeltaAvailable,
        Some(vec![todo("t1", "fresh"), todo("t2", "new")]),
        Some(vec![todo("t2", "newer")]),
        None,
        Some(10),
    ));

    // Act
    harness
        .reconciler
        .reconcile_todos(ReconcileMode::Incremental)
        .await
        .unwrap();

    // Assert
    assert_eq!(
        harness.todos.snapshot().await,
        vec![todo("t1", "fresh"), todo("t2", "newer"), todo("t9", "untouched")]
    );
}

#[tokio::test]
async fn apply_delta_deletes_after_upserts() {
    // Arrange
    let harness = Harness::with_todos(MemoryEntityStore::with_entities([todo("t1", "doomed")]));
    harness.todo_remote.respond(delta(
        CheckResult::DeltaAvailable,
        Some(vec![todo("t3", "created")]),
        None,
        Some(vec!["t1", "t3"]),
        Some(11),
    ));

    // Act
    harness
        .reconciler
        .reconcile_todos(ReconcileMode::Incremental)
        .await
        .unwrap();

    // Assert
    assert!(harness.todos.snapshot().await.is_empty());
}

#[tokio::test]
async fn apply_full_resync_touches_only_mentioned_entities() {
    // Arrange
    let harness = Harness::with_todos(MemoryEntityStore::with_entities([
        todo("t2", "old"),
        todo("t3", "removed remotely"),
        todo("t4", "kept locally"),
    ]));
    let t1 = todo("t1", "one");
    let t2 = todo("t2", "two");
    harness.todo_remote.respond(delta(
        CheckResult::FullResyncRequired,
        None,
        Some(vec![t1.clone(), t2.clone()]),
        Some(vec!["t3"]),
        Some(50),
    ));

    // Act
    let applied = harness
        .reconciler
        .reconcile_todos(ReconcileMode::Incremental)
        .await
        .unwrap();

    // Assert: t4 is absent from `updated` yet stays
    assert_eq!(applied.check_result, CheckResult::FullResyncRequired);
    assert_eq!(
        harness.todos.snapshot().await,
        vec![t1, t2, todo("t4", "kept locally")]
    );
}

#[tokio::test]
async fn apply_full_resync_ignores_created() {
    // Arrange
    let harness = Harness::new();
    harness.todo_remote.respond(delta(
        CheckResult::FullResyncRequired,
        Some(vec![todo("x", "ignored")]),
        Some(vec![todo("t1", "kept")]),
        None,
        None,
    ));

    // Act
    harness
        .reconciler
        .reconcile_todos(ReconcileMode::Full)
        .await
        .unwrap();

    // Assert
    assert_eq!(harness.todos.snapshot().await, vec![todo("t1", "kept")]);
}

#[tokio::test]
async fn apply_no_change_writes_nothing() {
    // Arrange
    let harness = Harness::with_todos(MemoryEntityStore::with_entities([todo("t1", "same")]));
    harness.todo_remote.respond(delta(
        CheckResult::NoChangeNeeded,
        None,
        Some(vec![todo("t1", "ignored")]),
        Some(vec!["t1"]),
        Some(20),
    ));
    // any write would fail
    harness.todos.fail_next_upserts(1);
    harness.todos.fail_next_deletes(1);

    // Act
    let applied = harness
        .reconciler
        .reconcile_todos(ReconcileMode::Incremental)
        .await
        .unwrap();

    // Assert
    assert!(applied.upserts().is_empty());
    assert!(applied.deletions().is_empty());
    assert_eq!(harness.todos.snapshot().await, vec![todo("t1", "same")]);
}

#[tokio::test]
async fn apply_sequence_converges_to_target_state() {
    // Arrange
    let harness = Harness::new();
    let script = [
        delta(
            CheckResult::DeltaAvailable,
            Some(vec![todo("a", "a1"), todo("b", "b1"), todo("c", "c1")]),
            None,
            None,
            Some(1),
        ),
        delta(
            CheckResult::DeltaAvailable,
            None,
            Some(vec![todo("a", "a2")]),
            Some(vec!["b"]),
            Some(2),
        ),
        delta(
            CheckResult::DeltaAvailable,
            Some(vec![todo("d", "d1")]),
            Some(vec![todo("c", "c2"), todo("a", "a3")]),
            Some(vec!["missing"]),
            Some(3),
        ),
    ];
    for d in script {
        harness.todo_remote.respond(d);
    }

    // Act
    for _ in 0..3 {
        harness
            .reconciler
            .reconcile_todos(ReconcileMode::Incremental)
            .await
            .unwrap();
    }

    // Assert
    assert_eq!(
        harness.todos.snapshot().await,
        vec![todo("a", "a3"), todo("c", "c2"), todo("d", "d1")]
    );
    let requests = harness.todo_remote.requests();
    let sent: Vec<_> = requests
        .iter()
        .map(|(cursor, _)| cursor.map(|c| c.timestamp_value))
        .collect();
    assert_eq!(sent, vec![None, Some(1), Some(2)]);
}
