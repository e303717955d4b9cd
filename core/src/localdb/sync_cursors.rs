// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{SyncCursor, SyncCursorStore, SyncError, SyncKind};

#[derive(Debug, Clone)]
pub struct SyncCursors {
    pool: SqlitePool,
}

impl SyncCursors {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists every stored cursor, ordered by kind name.
    pub async fn list(&self) -> Result<Vec<SyncCursor>, SyncError> {
        const SQL: &str = "SELECT kind, timestamp_value FROM sync_cursors ORDER BY kind;";

        let rows: Vec<(String, i64)> = sqlx::query_as(SQL).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|(kind, ts)| -> Result<SyncCursor, SyncError> {
                Ok(SyncCursor::new(kind.parse().map_err(SyncError::Decode)?, ts))
            })
            .collect()
    }
}

#[async_trait]
impl SyncCursorStore for SyncCursors {
    async fn load(&self, kind: SyncKind) -> Result<Option<SyncCursor>, SyncError> {
        const SQL: &str = "SELECT timestamp_value FROM sync_cursors WHERE kind = ?;";

        let ts: Option<i64> = sqlx::query_scalar(SQL)
            .bind(kind.as_ref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(ts.map(|ts| SyncCursor::new(kind, ts)))
    }

    async fn save(&self, cursor: SyncCursor) -> Result<(), SyncError> {
        const SQL: &str = "\
INSERT INTO sync_cursors (kind, timestamp_value)
VALUES (?, ?)
ON CONFLICT(kind) DO UPDATE SET
    timestamp_value = excluded.timestamp_value;
";

        sqlx::query(SQL)
            .bind(cursor.data_kind.as_ref())
            .bind(cursor.timestamp_value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
