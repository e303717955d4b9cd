// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::DataKind;

/// One queued local mutation waiting to be delivered to the remote service.
///
/// At most one task per [`TaskKey`] lives in a queue; appending a task for a key that is already
/// queued replaces the older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTask {
    /// The kind of the affected entity.
    pub data_kind: DataKind,

    /// The identifier of the affected entity.
    pub target_id: String,

    /// `true` deletes the entity remotely, `false` pushes the current local copy.
    pub is_removal: bool,

    /// Ordering key, reset on every reschedule.
    pub scheduled_at: Timestamp,

    /// Number of failed delivery attempts so far.
    pub failure_count: u32,
}

impl PendingTask {
    /// A task that pushes the current local state of an entity.
    pub fn push(data_kind: DataKind, target_id: impl Into<String>) -> Self {
        Self::new(data_kind, target_id, false)
    }

    /// A task that deletes an entity remotely.
    pub fn removal(data_kind: DataKind, target_id: impl Into<String>) -> Self {
        Self::new(data_kind, target_id, true)
    }

    fn new(data_kind: DataKind, target_id: impl Into<String>, is_removal: bool) -> Self {
        Self {
            data_kind,
            target_id: target_id.into(),
            is_removal,
            scheduled_at: Timestamp::now(),
            failure_count: 0,
        }
    }

    /// The deduplication key of this task.
    pub fn key(&self) -> TaskKey {
        TaskKey {
            data_kind: self.data_kind,
            target_id: self.target_id.clone(),
        }
    }

    /// The task to put back after a failed attempt at `now`.
    pub fn rescheduled(mut self, now: Timestamp) -> Self {
        self.scheduled_at = now;
        self.failure_count = self.failure_count.saturating_add(1);
        self
    }
}

/// Identity of a queued task, see [`PendingTask::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    /// The kind of the affected entity.
    pub data_kind: DataKind,
    /// The identifier of the affected entity.
    pub target_id: String,
}
