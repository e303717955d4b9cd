// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Entity, SyncError, SyncKind};

/// The last successfully applied sync point of one entity kind.
///
/// The timestamp value is opaque to the client; it is only ever handed back to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// The entity kind this cursor belongs to.
    pub data_kind: SyncKind,
    /// Server-issued bookmark.
    pub timestamp_value: i64,
}

impl SyncCursor {
    /// Creates a cursor.
    pub fn new(data_kind: SyncKind, timestamp_value: i64) -> Self {
        Self {
            data_kind,
            timestamp_value,
        }
    }
}

/// How to reconcile one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Ask for changes since the stored cursor.
    #[default]
    Incremental,
    /// Ignore the stored cursor.
    Full,
}

/// The server's verdict on a delta request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    /// The local copy is current.
    #[serde(rename = "no_change")]
    NoChangeNeeded,
    /// `created`, `updated` and `deleted_ids` describe the changes.
    #[serde(rename = "delta")]
    DeltaAvailable,
    /// The cursor is too old; `updated` carries the remaining set and `created` is meaningless.
    #[serde(rename = "full_resync")]
    FullResyncRequired,
}

/// One reconciliation response.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncDelta<T> {
    /// Entities the server reports as created.
    pub created: Option<Vec<T>>,
    /// Entities the server reports as updated.
    pub updated: Option<Vec<T>>,
    /// Identifiers of deleted entities.
    pub deleted_ids: Option<Vec<String>>,
    /// What the response means.
    pub check_result: CheckResult,
    /// The cursor to store once the delta is applied.
    pub new_cursor: Option<SyncCursor>,
}

impl<T> SyncDelta<T> {
    /// A response that carries no changes.
    pub fn no_change(new_cursor: Option<SyncCursor>) -> Self {
        Self {
            created: None,
            updated: None,
            deleted_ids: None,
            check_result: CheckResult::NoChangeNeeded,
            new_cursor,
        }
    }

    /// The identifiers the server reports as deleted, whatever the check result.
    pub fn deleted_ids(&self) -> &[String] {
        self.deleted_ids.as_deref().unwrap_or_default()
    }
}

impl<T: Entity> SyncDelta<T> {
    /// Checks the delta before anything is applied.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decode`] if an entity or a deleted id is empty.
    pub fn validate(&self) -> Result<(), SyncError> {
        let entities = self.created.iter().chain(self.updated.iter()).flatten();
        if entities.into_iter().any(|e| e.id().is_empty()) {
            return Err(SyncError::Decode(format!(
                "{} delta contains an entity without id",
                T::KIND
            )));
        }

        if self.deleted_ids().iter().any(String::is_empty) {
            return Err(SyncError::Decode(format!(
                "{} delta contains an empty deleted id",
                T::KIND
            )));
        }

        Ok(())
    }

    /// The entities to upsert locally, one per id, later entries winning.
    ///
    /// `created` and `updated` are merged for [`CheckResult::DeltaAvailable`]; only `updated`
    /// counts for [`CheckResult::FullResyncRequired`].
    pub fn upserts(&self) -> Vec<T> {
        let sources: Vec<&Vec<T>> = match self.check_result {
            CheckResult::NoChangeNeeded => Vec::new(),
            CheckResult::DeltaAvailable => self.created.iter().chain(self.updated.iter()).collect(),
            CheckResult::FullResyncRequired => self.updated.iter().collect(),
        };

        let mut merged: Vec<T> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for entity in sources.into_iter().flatten() {
            match positions.get(entity.id()) {
                Some(&i) => merged[i] = entity.clone(),
                None => {
                    positions.insert(entity.id().to_string(), merged.len());
                    merged.push(entity.clone());
                }
            }
        }
        merged
    }

    /// The identifiers to delete locally, none for [`CheckResult::NoChangeNeeded`].
    pub fn deletions(&self) -> &[String] {
        match self.check_result {
            CheckResult::NoChangeNeeded => &[],
            CheckResult::DeltaAvailable | CheckResult::FullResyncRequired => self.deleted_ids(),
        }
    }
}
