// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! SQLite-backed collaborators.

mod entities;
mod pending_tasks;
mod sync_cursors;


use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use crate::localdb::entities::Entities;
pub use crate::localdb::pending_tasks::PendingTasks;
pub use crate::localdb::sync_cursors::SyncCursors;
use crate::{Entity, SyncError};

pub(crate) static IN_MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// The local state database: upload queue, cursors and entity copies.
#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,

    /// The upload queue and its dead-letter list.
    pub pending_tasks: PendingTasks,
    /// Per-kind sync cursors.
    pub sync_cursors: SyncCursors,
}

impl LocalDb {
    /// Opens a sqlite database connection.
    /// If `filename` is `None`, it opens an in-memory database.
    pub async fn open(filename: Option<&Path>) -> Result<Self, SyncError> {
        let options = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            if let Some(parent) = filename.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    SyncError::Storage(format!("Failed to create state directory: {e}"))
                })?;
            }
            SqliteConnectOptions::new()
                .filename(filename)
                .create_if_missing(true)
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            // a named shared cache lets every pooled connection see the same database
            let db_id = IN_MEMORY_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
            SqliteConnectOptions::new()
                .filename(format!("file:calsync_mem_{db_id}?mode=memory&cache=shared"))
                .in_memory(true)
                .create_if_missing(true)
        };

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| SyncError::Storage(format!("Failed to connect to SQLite database: {e}")))?;

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        Ok(LocalDb {
            pending_tasks: PendingTasks::new(pool.clone()),
            sync_cursors: SyncCursors::new(pool.clone()),
            pool,
        })
    }

    /// The local copies of one entity type.
    pub fn entities<T: Entity>(&self) -> Entities<T> {
        Entities::new(self.pool.clone())
    }

    pub async fn close(self) -> Result<(), SyncError> {
        tracing::debug!("closing database connection");
        self.pool.close().await;
        Ok(())
    }
}
