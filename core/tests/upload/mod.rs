// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Tests of the upload drain loop against in-memory collaborators.


use std::sync::Arc;

use calsync_core::memory::{MemoryEntityStore, MemoryQueue};
use calsync_core::{Dispatcher, EntityLane, RetryPolicy, Tag, Todo, UploadDrainLoop};

use crate::common::RecordingGateway;

/// A drain loop with todo and tag lanes.
pub struct Harness {
    pub queue: Arc<MemoryQueue>,
    pub todos: Arc<MemoryEntityStore<Todo>>,
    pub tags: Arc<MemoryEntityStore<Tag>>,
    pub todo_remote: Arc<RecordingGateway<Todo>>,
    pub tag_remote: Arc<RecordingGateway<Tag>>,
    pub drain: UploadDrainLoop,
}

impl Harness {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_remotes(policy, RecordingGateway::new(), RecordingGateway::new(), true)
    }

    pub fn with_remotes(
        policy: RetryPolicy,
        todo_remote: RecordingGateway<Todo>,
        tag_remote: RecordingGateway<Tag>,
        mirror: bool,
    ) -> Self {
        let queue = Arc::new(MemoryQueue::new());
        let todos = Arc::new(MemoryEntityStore::new());
        let tags = Arc::new(MemoryEntityStore::new());
        let todo_remote = Arc::new(todo_remote);
        let tag_remote = Arc::new(tag_remote);

        let dispatcher = Dispatcher::new()
            .with_lane(EntityLane::<Todo>::new(todos.clone(), todo_remote.clone()).with_mirror(mirror))
            .with_lane(EntityLane::<Tag>::new(tags.clone(), tag_remote.clone()).with_mirror(mirror));
        let drain = UploadDrainLoop::new(queue.clone(), dispatcher, policy);

        Self {
            queue,
            todos,
            tags,
            todo_remote,
            tag_remote,
            drain,
        }
    }
}
