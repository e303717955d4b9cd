// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Local collaborators: the durable upload queue, the entity stores and the cursor store.

use async_trait::async_trait;

use crate::{Entity, PendingTask, SyncCursor, SyncError, SyncKind};

/// Durable store of pending uploads.
///
/// Implementations keep at most one task per [`TaskKey`](crate::TaskKey) and hand tasks out in
/// ascending `scheduled_at` order, ties broken by insertion order.
#[async_trait]
pub trait PendingQueueStore: Send + Sync {
    /// Appends a task, replacing any queued task with the same key.
    ///
    /// A dead-lettered task with the same key is superseded and dropped from the dead-letter list.
    async fn push_task(&self, task: PendingTask) -> Result<(), SyncError>;

    /// Appends several tasks in order, with the same replacement rule as [`Self::push_task`].
    async fn push_tasks(&self, tasks: Vec<PendingTask>) -> Result<(), SyncError> {
        for task in tasks {
            self.push_task(task).await?;
        }
        Ok(())
    }

    /// Removes and returns the next task, if any.
    async fn pop_task(&self) -> Result<Option<PendingTask>, SyncError>;

    /// Puts a task back after a failed attempt.
    ///
    /// Unlike [`Self::push_task`] this never replaces a task appended in the meantime: if the key
    /// is already queued the retried task is discarded.
    async fn requeue(&self, task: PendingTask) -> Result<(), SyncError>;

    /// Moves a task to the dead-letter list. It is no longer handed out by [`Self::pop_task`].
    ///
    /// If a newer task with the same key is queued, the poisoned one is discarded instead.
    async fn quarantine(&self, task: PendingTask) -> Result<(), SyncError>;

    /// Lists the dead-lettered tasks.
    async fn quarantined(&self) -> Result<Vec<PendingTask>, SyncError>;

    /// Moves every dead-lettered task back into the queue with a zero failure count, returning how
    /// many were released.
    async fn release_quarantined(&self) -> Result<usize, SyncError>;

    /// Lists the queued tasks in pop order.
    async fn list(&self) -> Result<Vec<PendingTask>, SyncError>;

    /// Number of queued tasks.
    async fn len(&self) -> Result<usize, SyncError> {
        Ok(self.list().await?.len())
    }
}

/// The authoritative local copy of one entity kind.
#[async_trait]
pub trait LocalEntityStore<T: Entity>: Send + Sync {
    /// Loads an entity by id.
    async fn load(&self, id: &str) -> Result<Option<T>, SyncError>;

    /// Inserts or replaces an entity.
    async fn upsert(&self, entity: T) -> Result<(), SyncError>;

    /// Inserts or replaces several entities.
    async fn upsert_many(&self, entities: Vec<T>) -> Result<(), SyncError>;

    /// Deletes an entity. Deleting a missing entity is not an error.
    async fn delete(&self, id: &str) -> Result<(), SyncError>;

    /// Deletes several entities.
    async fn delete_many(&self, ids: &[String]) -> Result<(), SyncError>;
}

/// Durable last-synced cursor per syncable kind.
#[async_trait]
pub trait SyncCursorStore: Send + Sync {
    /// Loads the cursor of a kind, `None` before the first successful reconciliation.
    async fn load(&self, kind: SyncKind) -> Result<Option<SyncCursor>, SyncError>;

    /// Stores a cursor, keyed by its data kind.
    async fn save(&self, cursor: SyncCursor) -> Result<(), SyncError>;
}
