// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

/// The category of a queued mutation.
///
/// Every pending upload names exactly one data kind, which selects the local store and the remote
/// gateway used to deliver it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// A tag used to group todos and schedules.
    Tag,
    /// A todo item.
    Todo,
    /// A scheduled event.
    Schedule,
    /// The detail blob attached to a todo or schedule.
    EventDetail,
    /// A completed todo record.
    DoneTodo,
    /// The detail blob attached to a completed todo record.
    DoneTodoDetail,
}

impl DataKind {
    /// All data kinds, in a stable order.
    pub const ALL: [DataKind; 6] = [
        DataKind::Tag,
        DataKind::Todo,
        DataKind::Schedule,
        DataKind::EventDetail,
        DataKind::DoneTodo,
        DataKind::DoneTodoDetail,
    ];

    /// The syncable kind this data kind maps to, if it takes part in reconciliation.
    pub fn syncable(self) -> Option<SyncKind> {
        match self {
            DataKind::Tag => Some(SyncKind::Tag),
            DataKind::Todo => Some(SyncKind::Todo),
            DataKind::Schedule => Some(SyncKind::Schedule),
            DataKind::EventDetail | DataKind::DoneTodo | DataKind::DoneTodoDetail => None,
        }
    }
}

const KIND_TAG: &str = "tag";
const KIND_TODO: &str = "todo";
const KIND_SCHEDULE: &str = "schedule";
const KIND_EVENT_DETAIL: &str = "event_detail";
const KIND_DONE_TODO: &str = "done_todo";
const KIND_DONE_TODO_DETAIL: &str = "done_todo_detail";

impl AsRef<str> for DataKind {
    fn as_ref(&self) -> &str {
        match self {
            DataKind::Tag => KIND_TAG,
            DataKind::Todo => KIND_TODO,
            DataKind::Schedule => KIND_SCHEDULE,
            DataKind::EventDetail => KIND_EVENT_DETAIL,
            DataKind::DoneTodo => KIND_DONE_TODO,
            DataKind::DoneTodoDetail => KIND_DONE_TODO_DETAIL,
        }
    }
}

impl Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl FromStr for DataKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            KIND_TAG => Ok(DataKind::Tag),
            KIND_TODO => Ok(DataKind::Todo),
            KIND_SCHEDULE => Ok(DataKind::Schedule),
            KIND_EVENT_DETAIL => Ok(DataKind::EventDetail),
            KIND_DONE_TODO => Ok(DataKind::DoneTodo),
            KIND_DONE_TODO_DETAIL => Ok(DataKind::DoneTodoDetail),
            _ => Err(format!("Unknown data kind: {value}")),
        }
    }
}

/// The entity kinds that take part in pull-based reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// Tags.
    Tag,
    /// Todos.
    Todo,
    /// Schedules.
    Schedule,
}

impl SyncKind {
    /// All syncable kinds, in reconciliation order.
    pub const ALL: [SyncKind; 3] = [SyncKind::Tag, SyncKind::Todo, SyncKind::Schedule];
}

impl From<SyncKind> for DataKind {
    fn from(kind: SyncKind) -> Self {
        match kind {
            SyncKind::Tag => DataKind::Tag,
            SyncKind::Todo => DataKind::Todo,
            SyncKind::Schedule => DataKind::Schedule,
        }
    }
}

impl AsRef<str> for SyncKind {
    fn as_ref(&self) -> &str {
        match self {
            SyncKind::Tag => KIND_TAG,
            SyncKind::Todo => KIND_TODO,
            SyncKind::Schedule => KIND_SCHEDULE,
        }
    }
}

impl Display for SyncKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl FromStr for SyncKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let kind: DataKind = value.parse()?;
        kind.syncable()
            .ok_or_else(|| format!("Data kind is not syncable: {value}"))
    }
}
