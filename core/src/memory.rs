// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory collaborators, for embedders without durable storage and for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    Entity, LocalEntityStore, PendingQueueStore, PendingTask, SyncCursor, SyncCursorStore,
    SyncError, SyncKind,
};

/// A [`PendingQueueStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    inner: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    next_seq: u64,
    queued: Vec<(u64, PendingTask)>,
    dead: Vec<PendingTask>,
}

impl QueueState {
    fn insert(&mut self, task: PendingTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queued.push((seq, task));
    }

    fn position(&self, task: &PendingTask) -> Option<usize> {
        self.queued.iter().position(|(_, t)| {
            t.data_kind == task.data_kind && t.target_id == task.target_id
        })
    }

    fn forget_dead(&mut self, task: &PendingTask) {
        self.dead
            .retain(|t| t.data_kind != task.data_kind || t.target_id != task.target_id);
    }

    fn sorted(&self) -> Vec<&(u64, PendingTask)> {
        let mut entries: Vec<_> = self.queued.iter().collect();
        entries.sort_by_key(|(seq, t)| (t.scheduled_at, *seq));
        entries
    }
}

impl MemoryQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingQueueStore for MemoryQueue {
    async fn push_task(&self, task: PendingTask) -> Result<(), SyncError> {
        let mut state = self.inner.lock().await;
        if let Some(i) = state.position(&task) {
            state.queued.remove(i);
        }
        state.forget_dead(&task);
        state.insert(task);
        Ok(())
    }

    async fn pop_task(&self) -> Result<Option<PendingTask>, SyncError> {
        let mut state = self.inner.lock().await;
        let Some(&(seq, _)) = state.sorted().first().copied() else {
            return Ok(None);
        };
        let i = state.queued.iter().position(|(s, _)| *s == seq);
        Ok(i.map(|i| state.queued.remove(i).1))
    }

    async fn requeue(&self, task: PendingTask) -> Result<(), SyncError> {
        let mut state = self.inner.lock().await;
        if state.position(&task).is_none() {
            state.insert(task);
        }
        Ok(())
    }

    async fn quarantine(&self, task: PendingTask) -> Result<(), SyncError> {
        let mut state = self.inner.lock().await;
        if state.position(&task).is_some() {
            tracing::debug!(
                kind = %task.data_kind,
                id = %task.target_id,
                "newer task queued, poisoned task discarded"
            );
            return Ok(());
        }
        state.forget_dead(&task);
        state.dead.push(task);
        Ok(())
    }

    async fn quarantined(&self) -> Result<Vec<PendingTask>, SyncError> {
        Ok(self.inner.lock().await.dead.clone())
    }

    async fn release_quarantined(&self) -> Result<usize, SyncError> {
        let mut state = self.inner.lock().await;
        let dead = std::mem::take(&mut state.dead);
        let count = dead.len();
        for mut task in dead {
            task.failure_count = 0;
            if state.position(&task).is_none() {
                state.insert(task);
            }
        }
        Ok(count)
    }

    async fn list(&self) -> Result<Vec<PendingTask>, SyncError> {
        let state = self.inner.lock().await;
        Ok(state.sorted().into_iter().map(|(_, t)| t.clone()).collect())
    }

    async fn len(&self) -> Result<usize, SyncError> {
        Ok(self.inner.lock().await.queued.len())
    }
}

/// A [`LocalEntityStore`] kept in memory, with fault injection.
#[derive(Debug)]
pub struct MemoryEntityStore<T> {
    entities: Mutex<BTreeMap<String, T>>,
    failing_upserts: AtomicUsize,
    failing_deletes: AtomicUsize,
}

impl<T> Default for MemoryEntityStore<T> {
    fn default() -> Self {
        Self {
            entities: Mutex::new(BTreeMap::new()),
            failing_upserts: AtomicUsize::new(0),
            failing_deletes: AtomicUsize::new(0),
        }
    }
}

impl<T: Entity> MemoryEntityStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `entities`.
    pub fn with_entities(entities: impl IntoIterator<Item = T>) -> Self {
        let map = entities
            .into_iter()
            .map(|e| (e.id().to_string(), e))
            .collect();

        Self {
            entities: Mutex::new(map),
            ..Self::default()
        }
    }

    /// All entities, ordered by id.
    pub async fn snapshot(&self) -> Vec<T> {
        self.entities.lock().await.values().cloned().collect()
    }

    /// Makes the next `n` upsert calls fail with [`SyncError::Storage`] without writing anything.
    pub fn fail_next_upserts(&self, n: usize) {
        self.failing_upserts.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` delete calls fail with [`SyncError::Storage`] without deleting anything.
    pub fn fail_next_deletes(&self, n: usize) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    fn injected(counter: &AtomicUsize, op: &str) -> Result<(), SyncError> {
        let hit = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        match hit {
            true => Err(SyncError::Storage(format!("injected {op} failure"))),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl<T: Entity> LocalEntityStore<T> for MemoryEntityStore<T> {
    async fn load(&self, id: &str) -> Result<Option<T>, SyncError> {
        Ok(self.entities.lock().await.get(id).cloned())
    }

    async fn upsert(&self, entity: T) -> Result<(), SyncError> {
        Self::injected(&self.failing_upserts, "upsert")?;
        let mut entities = self.entities.lock().await;
        entities.insert(entity.id().to_string(), entity);
        Ok(())
    }

    async fn upsert_many(&self, batch: Vec<T>) -> Result<(), SyncError> {
        Self::injected(&self.failing_upserts, "upsert")?;
        let mut entities = self.entities.lock().await;
        for entity in batch {
            entities.insert(entity.id().to_string(), entity);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SyncError> {
        Self::injected(&self.failing_deletes, "delete")?;
        self.entities.lock().await.remove(id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), SyncError> {
        Self::injected(&self.failing_deletes, "delete")?;
        let mut entities = self.entities.lock().await;
        for id in ids {
            entities.remove(id);
        }
        Ok(())
    }
}

/// A [`SyncCursorStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursors: Mutex<HashMap<SyncKind, SyncCursor>>,
}

impl MemoryCursorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncCursorStore for MemoryCursorStore {
    async fn load(&self, kind: SyncKind) -> Result<Option<SyncCursor>, SyncError> {
        Ok(self.cursors.lock().await.get(&kind).copied())
    }

    async fn save(&self, cursor: SyncCursor) -> Result<(), SyncError> {
        self.cursors.lock().await.insert(cursor.data_kind, cursor);
        Ok(())
    }
}
