// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Tests of the sync reconciler against in-memory collaborators.

mod apply;
mod routing;

use std::sync::Arc;

use calsync_core::memory::{MemoryCursorStore, MemoryEntityStore};
use calsync_core::{Schedule, SyncLane, SyncReconciler, Tag, Todo};

use crate::common::ScriptedQueryGateway;

/// A reconciler with all three lanes.
pub struct Harness {
    pub cursors: Arc<MemoryCursorStore>,
    pub tags: Arc<MemoryEntityStore<Tag>>,
    pub todos: Arc<MemoryEntityStore<Todo>>,
    pub schedules: Arc<MemoryEntityStore<Schedule>>,
    pub tag_remote: Arc<ScriptedQueryGateway<Tag>>,
    pub todo_remote: Arc<ScriptedQueryGateway<Todo>>,
    pub schedule_remote: Arc<ScriptedQueryGateway<Schedule>>,
    pub reconciler: SyncReconciler,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_todos(MemoryEntityStore::new())
    }

    pub fn with_todos(todos: MemoryEntityStore<Todo>) -> Self {
        let cursors = Arc::new(MemoryCursorStore::new());
        let tags = Arc::new(MemoryEntityStore::new());
        let todos = Arc::new(todos);
        let schedules = Arc::new(MemoryEntityStore::new());
        let tag_remote = Arc::new(ScriptedQueryGateway::new());
        let todo_remote = Arc::new(ScriptedQueryGateway::new());
        let schedule_remote = Arc::new(ScriptedQueryGateway::new());

        let reconciler = SyncReconciler::new(cursors.clone())
            .with_tags(SyncLane::<Tag>::new(tag_remote.clone(), tags.clone()))
            .with_todos(SyncLane::<Todo>::new(todo_remote.clone(), todos.clone()))
            .with_schedules(SyncLane::<Schedule>::new(
                schedule_remote.clone(),
                schedules.clone(),
            ));

        Self {
            cursors,
            tags,
            todos,
            schedules,
            tag_remote,
            todo_remote,
            schedule_remote,
            reconciler,
        }
    }
}
