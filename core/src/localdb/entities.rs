// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{Entity, LocalEntityStore, SyncError};

/// Local copies of one entity type, stored as JSON documents.
#[derive(Debug)]
pub struct Entities<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Entities<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Entities<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// All entities of this type, ordered by id.
    pub async fn list(&self) -> Result<Vec<T>, SyncError> {
        const SQL: &str = "SELECT payload FROM entities WHERE kind = ? ORDER BY id;";

        let payloads: Vec<String> = sqlx::query_scalar(SQL)
            .bind(T::KIND.as_ref())
            .fetch_all(&self.pool)
            .await?;

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(SyncError::from))
            .collect()
    }
}

const SQL_UPSERT: &str = "\
INSERT INTO entities (kind, id, payload)
VALUES (?, ?, ?)
ON CONFLICT(kind, id) DO UPDATE SET
    payload = excluded.payload;
";

const SQL_DELETE: &str = "DELETE FROM entities WHERE kind = ? AND id = ?;";

#[async_trait]
impl<T: Entity> LocalEntityStore<T> for Entities<T> {
    async fn load(&self, id: &str) -> Result<Option<T>, SyncError> {
        const SQL: &str = "SELECT payload FROM entities WHERE kind = ? AND id = ?;";

        let payload: Option<String> = sqlx::query_scalar(SQL)
            .bind(T::KIND.as_ref())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, entity: T) -> Result<(), SyncError> {
        let payload = serde_json::to_string(&entity)?;
        sqlx::query(SQL_UPSERT)
            .bind(T::KIND.as_ref())
            .bind(entity.id())
            .bind(payload)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn upsert_many(&self, entities: Vec<T>) -> Result<(), SyncError> {
        let mut tx = self.pool.begin().await?;
        for entity in &entities {
            let payload = serde_json::to_string(entity)?;
            sqlx::query(SQL_UPSERT)
                .bind(T::KIND.as_ref())
                .bind(entity.id())
                .bind(payload)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SyncError> {
        sqlx::query(SQL_DELETE)
            .bind(T::KIND.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), SyncError> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query(SQL_DELETE)
                .bind(T::KIND.as_ref())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
