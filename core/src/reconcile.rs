// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Pull-based reconciliation of remote changes into the local stores.

use std::sync::Arc;

use crate::{
    CheckResult, Entity, LocalEntityStore, ReconcileMode, RemoteQueryGateway, Schedule,
    SyncCursor, SyncCursorStore, SyncDelta, SyncError, SyncKind, Tag, Todo,
};

/// The remote query gateway and the local store of one syncable entity type.
pub struct SyncLane<T: Entity> {
    remote: Arc<dyn RemoteQueryGateway<T>>,
    local: Arc<dyn LocalEntityStore<T>>,
}

impl<T: Entity> SyncLane<T> {
    /// Pairs a gateway with a store.
    pub fn new(remote: Arc<dyn RemoteQueryGateway<T>>, local: Arc<dyn LocalEntityStore<T>>) -> Self {
        Self { remote, local }
    }
}

/// A delta that was applied locally, tagged by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciledDelta {
    /// Tags.
    Tag(SyncDelta<Tag>),
    /// Todos.
    Todo(SyncDelta<Todo>),
    /// Schedules.
    Schedule(SyncDelta<Schedule>),
}

impl ReconciledDelta {
    /// The kind of the delta.
    pub fn kind(&self) -> SyncKind {
        match self {
            ReconciledDelta::Tag(_) => SyncKind::Tag,
            ReconciledDelta::Todo(_) => SyncKind::Todo,
            ReconciledDelta::Schedule(_) => SyncKind::Schedule,
        }
    }

    /// The server's verdict.
    pub fn check_result(&self) -> CheckResult {
        match self {
            ReconciledDelta::Tag(d) => d.check_result,
            ReconciledDelta::Todo(d) => d.check_result,
            ReconciledDelta::Schedule(d) => d.check_result,
        }
    }

    /// The cursor stored by this reconciliation, if the server sent one.
    pub fn new_cursor(&self) -> Option<SyncCursor> {
        match self {
            ReconciledDelta::Tag(d) => d.new_cursor,
            ReconciledDelta::Todo(d) => d.new_cursor,
            ReconciledDelta::Schedule(d) => d.new_cursor,
        }
    }

    /// Number of entities upserted and deleted locally.
    pub fn applied(&self) -> (usize, usize) {
        fn count<T: Entity>(d: &SyncDelta<T>) -> (usize, usize) {
            (d.upserts().len(), d.deletions().len())
        }

        match self {
            ReconciledDelta::Tag(d) => count(d),
            ReconciledDelta::Todo(d) => count(d),
            ReconciledDelta::Schedule(d) => count(d),
        }
    }
}

/// Fetches remote deltas and applies them, advancing the per-kind cursor only after a complete
/// apply.
///
/// Reconciliations of the same kind must not run concurrently; callers serialize them.
pub struct SyncReconciler {
    cursors: Arc<dyn SyncCursorStore>,
    tags: Option<SyncLane<Tag>>,
    todos: Option<SyncLane<Todo>>,
    schedules: Option<SyncLane<Schedule>>,
}

impl SyncReconciler {
    /// Creates a reconciler without lanes.
    pub fn new(cursors: Arc<dyn SyncCursorStore>) -> Self {
        Self {
            cursors,
            tags: None,
            todos: None,
            schedules: None,
        }
    }

    /// Sets the tag lane.
    pub fn with_tags(mut self, lane: SyncLane<Tag>) -> Self {
        self.tags = Some(lane);
        self
    }

    /// Sets the todo lane.
    pub fn with_todos(mut self, lane: SyncLane<Todo>) -> Self {
        self.todos = Some(lane);
        self
    }

    /// Sets the schedule lane.
    pub fn with_schedules(mut self, lane: SyncLane<Schedule>) -> Self {
        self.schedules = Some(lane);
        self
    }

    /// Reconciles one kind and returns the applied delta.
    ///
    /// # Errors
    ///
    /// Fails without touching the cursor if fetching, validating or applying the delta fails.
    /// Returns [`SyncError::Unsupported`] if no lane is set for `kind`.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(
        &self,
        kind: SyncKind,
        mode: ReconcileMode,
    ) -> Result<ReconciledDelta, SyncError> {
        match kind {
            SyncKind::Tag => self.reconcile_tags(mode).await.map(ReconciledDelta::Tag),
            SyncKind::Todo => self.reconcile_todos(mode).await.map(ReconciledDelta::Todo),
            SyncKind::Schedule => self
                .reconcile_schedules(mode)
                .await
                .map(ReconciledDelta::Schedule),
        }
    }

    /// Reconciles tags, then todos, then schedules, stopping at the first failure.
    pub async fn reconcile_all(
        &self,
        mode: ReconcileMode,
    ) -> Result<Vec<ReconciledDelta>, SyncError> {
        let mut deltas = Vec::with_capacity(SyncKind::ALL.len());
        for kind in SyncKind::ALL {
            deltas.push(self.reconcile(kind, mode).await?);
        }
        Ok(deltas)
    }

    /// Reconciles tags.
    pub async fn reconcile_tags(&self, mode: ReconcileMode) -> Result<SyncDelta<Tag>, SyncError> {
        self.reconcile_lane(self.tags.as_ref(), SyncKind::Tag, mode).await
    }

    /// Reconciles todos.
    pub async fn reconcile_todos(&self, mode: ReconcileMode) -> Result<SyncDelta<Todo>, SyncError> {
        self.reconcile_lane(self.todos.as_ref(), SyncKind::Todo, mode).await
    }

    /// Reconciles schedules.
    pub async fn reconcile_schedules(
        &self,
        mode: ReconcileMode,
    ) -> Result<SyncDelta<Schedule>, SyncError> {
        self.reconcile_lane(self.schedules.as_ref(), SyncKind::Schedule, mode)
            .await
    }

    async fn reconcile_lane<T: Entity>(
        &self,
        lane: Option<&SyncLane<T>>,
        kind: SyncKind,
        mode: ReconcileMode,
    ) -> Result<SyncDelta<T>, SyncError> {
        let lane = lane.ok_or(SyncError::Unsupported(kind.into()))?;

        let stored = self.cursors.load(kind).await?;
        let (cursor, full) = match mode {
            ReconcileMode::Incremental => (stored, false),
            ReconcileMode::Full => (None, true),
        };

        let delta = lane.remote.fetch_delta(cursor.as_ref(), full).await?;
        delta.validate()?;
        if let Some(new) = &delta.new_cursor {
            if new.data_kind != kind {
                return Err(SyncError::Decode(format!(
                    "{kind} delta carries a {} cursor",
                    new.data_kind
                )));
            }
        }

        let upserts = delta.upserts();
        let deleted = delta.deletions();
        tracing::debug!(
            check_result = ?delta.check_result,
            upserts = upserts.len(),
            deletes = deleted.len(),
            "applying delta"
        );
        if !upserts.is_empty() {
            lane.local.upsert_many(upserts).await?;
        }
        if !deleted.is_empty() {
            lane.local.delete_many(deleted).await?;
        }

        if let Some(new) = delta.new_cursor {
            if let Some(old) = stored.filter(|old| new.timestamp_value < old.timestamp_value) {
                tracing::warn!(
                    old = old.timestamp_value,
                    new = new.timestamp_value,
                    "server returned an older cursor"
                );
            }
            self.cursors.save(new).await?;
        }

        Ok(delta)
    }
}
