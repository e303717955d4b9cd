// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::SqlitePool;

use crate::{PendingQueueStore, PendingTask, SyncError};

/// The durable upload queue.
#[derive(Debug, Clone)]
pub struct PendingTasks {
    pool: SqlitePool,
}

impl PendingTasks {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingQueueStore for PendingTasks {
    async fn push_task(&self, task: PendingTask) -> Result<(), SyncError> {
        self.push_tasks(vec![task]).await
    }

    async fn push_tasks(&self, tasks: Vec<PendingTask>) -> Result<(), SyncError> {
        // REPLACE deletes the old row, so the new one gets a fresh `seq`
        const SQL: &str = "\
INSERT OR REPLACE INTO pending_tasks (data_kind, target_id, is_removal, scheduled_at, failure_count)
VALUES (?, ?, ?, ?, ?);
";
        // a newer intent supersedes a dead-lettered one
        const SQL_FORGET_DEAD: &str = "\
DELETE FROM dead_tasks
WHERE data_kind = ? AND target_id = ?;
";

        let mut tx = self.pool.begin().await?;
        for task in &tasks {
            let record = TaskRecord::from(task);
            sqlx::query(SQL)
                .bind(&record.data_kind)
                .bind(&record.target_id)
                .bind(record.is_removal)
                .bind(record.scheduled_at)
                .bind(record.failure_count)
                .execute(&mut *tx)
                .await?;
            sqlx::query(SQL_FORGET_DEAD)
                .bind(&record.data_kind)
                .bind(&record.target_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn pop_task(&self) -> Result<Option<PendingTask>, SyncError> {
        const SQL: &str = "\
DELETE FROM pending_tasks
WHERE seq = (SELECT seq FROM pending_tasks ORDER BY scheduled_at, seq LIMIT 1)
RETURNING data_kind, target_id, is_removal, scheduled_at, failure_count;
";

        let record: Option<TaskRecord> = sqlx::query_as(SQL).fetch_optional(&self.pool).await?;
        record.map(PendingTask::try_from).transpose()
    }

    async fn requeue(&self, task: PendingTask) -> Result<(), SyncError> {
        const SQL: &str = "\
INSERT OR IGNORE INTO pending_tasks (data_kind, target_id, is_removal, scheduled_at, failure_count)
VALUES (?, ?, ?, ?, ?);
";

        let record = TaskRecord::from(&task);
        let result = sqlx::query(SQL)
            .bind(&record.data_kind)
            .bind(&record.target_id)
            .bind(record.is_removal)
            .bind(record.scheduled_at)
            .bind(record.failure_count)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                kind = %task.data_kind,
                id = %task.target_id,
                "newer task queued, retry discarded"
            );
        }
        Ok(())
    }

    async fn quarantine(&self, task: PendingTask) -> Result<(), SyncError> {
        const SQL: &str = "\
INSERT OR REPLACE INTO dead_tasks (data_kind, target_id, is_removal, scheduled_at, failure_count)
SELECT ?1, ?2, ?3, ?4, ?5
WHERE NOT EXISTS (SELECT 1 FROM pending_tasks WHERE data_kind = ?1 AND target_id = ?2);
";

        let record = TaskRecord::from(&task);
        let result = sqlx::query(SQL)
            .bind(&record.data_kind)
            .bind(&record.target_id)
            .bind(record.is_removal)
            .bind(record.scheduled_at)
            .bind(record.failure_count)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                kind = %task.data_kind,
                id = %task.target_id,
                "newer task queued, poisoned task discarded"
            );
        }
        Ok(())
    }

    async fn quarantined(&self) -> Result<Vec<PendingTask>, SyncError> {
        const SQL: &str = "\
SELECT data_kind, target_id, is_removal, scheduled_at, failure_count
FROM dead_tasks
ORDER BY scheduled_at;
";

        let records: Vec<TaskRecord> = sqlx::query_as(SQL).fetch_all(&self.pool).await?;
        records.into_iter().map(PendingTask::try_from).collect()
    }

    async fn release_quarantined(&self) -> Result<usize, SyncError> {
        const SQL_RELEASE: &str = "\
INSERT OR IGNORE INTO pending_tasks (data_kind, target_id, is_removal, scheduled_at, failure_count)
SELECT data_kind, target_id, is_removal, scheduled_at, 0
FROM dead_tasks
ORDER BY scheduled_at;
";
        const SQL_CLEAR: &str = "DELETE FROM dead_tasks;";

        let mut tx = self.pool.begin().await?;
        sqlx::query(SQL_RELEASE).execute(&mut *tx).await?;
        let released = sqlx::query(SQL_CLEAR).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(released.rows_affected() as usize)
    }

    async fn list(&self) -> Result<Vec<PendingTask>, SyncError> {
        const SQL: &str = "\
SELECT data_kind, target_id, is_removal, scheduled_at, failure_count
FROM pending_tasks
ORDER BY scheduled_at, seq;
";

        let records: Vec<TaskRecord> = sqlx::query_as(SQL).fetch_all(&self.pool).await?;
        records.into_iter().map(PendingTask::try_from).collect()
    }

    async fn len(&self) -> Result<usize, SyncError> {
        const SQL: &str = "SELECT COUNT(*) FROM pending_tasks;";

        let count: i64 = sqlx::query_scalar(SQL).fetch_one(&self.pool).await?;
        Ok(count as usize)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRecord {
    data_kind: String,
    target_id: String,
    is_removal: bool,
    scheduled_at: i64,
    failure_count: u32,
}

impl From<&PendingTask> for TaskRecord {
    fn from(task: &PendingTask) -> Self {
        Self {
            data_kind: task.data_kind.to_string(),
            target_id: task.target_id.clone(),
            is_removal: task.is_removal,
            scheduled_at: task.scheduled_at.as_microsecond(),
            failure_count: task.failure_count,
        }
    }
}

impl TryFrom<TaskRecord> for PendingTask {
    type Error = SyncError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let data_kind = record.data_kind.parse().map_err(SyncError::Decode)?;
        let scheduled_at = Timestamp::from_microsecond(record.scheduled_at)
            .map_err(|e| SyncError::Decode(format!("Invalid scheduled_at: {e}")))?;

        Ok(PendingTask {
            data_kind,
            target_id: record.target_id,
            is_removal: record.is_removal,
            scheduled_at,
            failure_count: record.failure_count,
        })
    }
}
