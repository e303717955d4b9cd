// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use calsync_core::{CheckResult, SyncCursor, SyncDelta, SyncKind};
use serde::Deserialize;

/// The body of a `GET /v1/{resource}/sync` response.
#[derive(Debug, Clone, Deserialize)]
pub struct DeltaBody<T> {
    /// The server's verdict.
    pub check_result: CheckResult,
    /// Entities created since the cursor.
    pub created: Option<Vec<T>>,
    /// Entities updated since the cursor, or the remaining set on a full resync.
    pub updated: Option<Vec<T>>,
    /// Identifiers removed since the cursor.
    pub deleted: Option<Vec<String>>,
    /// The cursor value to continue from.
    pub timestamp: Option<i64>,
}

impl<T> DeltaBody<T> {
    /// Converts into a delta whose cursor belongs to `kind`.
    pub fn into_delta(self, kind: SyncKind) -> SyncDelta<T> {
        SyncDelta {
            created: self.created,
            updated: self.updated,
            deleted_ids: self.deleted,
            check_result: self.check_result,
            new_cursor: self.timestamp.map(|ts| SyncCursor::new(kind, ts)),
        }
    }
}
