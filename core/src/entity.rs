// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use jiff::civil::Date;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::DataKind;

/// A record that can be stored locally and delivered remotely.
///
/// The associated [`DataKind`] is fixed per type, so routing never inspects a payload at runtime.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The data kind of this entity type.
    const KIND: DataKind;

    /// The identifier shared by the local copy and the remote copy.
    fn id(&self) -> &str;
}

/// When an event happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventTime {
    /// A single instant.
    At {
        /// The instant.
        time: Timestamp,
    },

    /// A span between two instants.
    Period {
        /// Start of the span, inclusive.
        start: Timestamp,
        /// End of the span, exclusive.
        end: Timestamp,
    },

    /// Whole days in the owner's calendar.
    AllDay {
        /// First day, inclusive.
        start: Date,
        /// Last day, inclusive.
        end: Date,
    },
}

/// Recurrence of a todo or schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeating {
    /// The first occurrence.
    pub start: Timestamp,

    /// No occurrences after this instant, if set.
    #[serde(default)]
    pub end: Option<Timestamp>,

    /// The recurrence rule, e.g. `every_week:mon,wed`.
    pub rule: String,
}

/// A tag used to group todos and schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Identifier.
    pub uuid: String,
    /// Display name.
    pub name: String,
    /// Display color, as `#RRGGBB`.
    #[serde(default)]
    pub color_hex: Option<String>,
}

impl Entity for Tag {
    const KIND: DataKind = DataKind::Tag;

    fn id(&self) -> &str {
        &self.uuid
    }
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Identifier.
    pub uuid: String,
    /// Summary line.
    pub name: String,
    /// The tag this todo belongs to.
    #[serde(default)]
    pub event_tag_id: Option<String>,
    /// Due time.
    #[serde(default)]
    pub event_time: Option<EventTime>,
    /// Recurrence.
    #[serde(default)]
    pub repeating: Option<Repeating>,
    /// Notification offsets in seconds before the due time.
    #[serde(default)]
    pub notification_offsets: Vec<i64>,
    /// Creation time assigned by the server.
    #[serde(default)]
    pub create_timestamp: Option<Timestamp>,
}

impl Entity for Todo {
    const KIND: DataKind = DataKind::Todo;

    fn id(&self) -> &str {
        &self.uuid
    }
}

/// A scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Identifier.
    pub uuid: String,
    /// Summary line.
    pub name: String,
    /// The tag this schedule belongs to.
    #[serde(default)]
    pub event_tag_id: Option<String>,
    /// When the schedule happens.
    pub event_time: EventTime,
    /// Recurrence.
    #[serde(default)]
    pub repeating: Option<Repeating>,
    /// Occurrences removed from the recurrence, by their start time.
    #[serde(default)]
    pub excludes: Vec<Timestamp>,
    /// Whether to show the occurrence count next to the name.
    #[serde(default)]
    pub show_turn: bool,
}

impl Entity for Schedule {
    const KIND: DataKind = DataKind::Schedule;

    fn id(&self) -> &str {
        &self.uuid
    }
}

/// Free-form details attached to a todo or schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetail {
    /// The todo or schedule these details belong to.
    pub event_id: String,
    /// Location.
    #[serde(default)]
    pub place: Option<String>,
    /// Related link.
    #[serde(default)]
    pub url: Option<String>,
    /// Notes.
    #[serde(default)]
    pub memo: Option<String>,
}

impl Entity for EventDetail {
    const KIND: DataKind = DataKind::EventDetail;

    fn id(&self) -> &str {
        &self.event_id
    }
}

/// A completed todo occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneTodo {
    /// Identifier.
    pub uuid: String,
    /// The todo this record was completed from.
    pub origin_event_id: String,
    /// Summary line at completion time.
    pub name: String,
    /// When the todo was completed.
    pub done_time: Timestamp,
    /// The tag at completion time.
    #[serde(default)]
    pub event_tag_id: Option<String>,
    /// The due time at completion time.
    #[serde(default)]
    pub event_time: Option<EventTime>,
}

impl Entity for DoneTodo {
    const KIND: DataKind = DataKind::DoneTodo;

    fn id(&self) -> &str {
        &self.uuid
    }
}

/// Free-form details attached to a completed todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneTodoDetail {
    /// The completed todo these details belong to.
    pub done_todo_id: String,
    /// Location.
    #[serde(default)]
    pub place: Option<String>,
    /// Related link.
    #[serde(default)]
    pub url: Option<String>,
    /// Notes.
    #[serde(default)]
    pub memo: Option<String>,
}

impl Entity for DoneTodoDetail {
    const KIND: DataKind = DataKind::DoneTodoDetail;

    fn id(&self) -> &str {
        &self.done_todo_id
    }
}
