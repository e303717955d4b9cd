// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Offline-first upload queue and incremental sync engine for calendar data.
//!
//! Local edits are written to a [`LocalEntityStore`] and recorded as [`PendingTask`]s, which an
//! [`UploadDrainLoop`] delivers to the remote service in the background. A [`SyncReconciler`]
//! independently pulls remote changes per [`SyncKind`] and merges them into the local stores.

mod config;
mod delta;
mod entity;
mod error;
mod gateway;
mod kind;
pub mod localdb;
pub mod memory;
mod reconcile;
mod store;
mod task;
mod upload;

pub use crate::config::{
    APP_NAME, Config, ConfigDuration, UploadConfig, expand_path, get_config_dir,
};
pub use crate::delta::{CheckResult, ReconcileMode, SyncCursor, SyncDelta};
pub use crate::entity::{
    DoneTodo, DoneTodoDetail, Entity, EventDetail, EventTime, Repeating, Schedule, Tag, Todo,
};
pub use crate::error::SyncError;
pub use crate::gateway::{RemoteMutationGateway, RemoteQueryGateway};
pub use crate::kind::{DataKind, SyncKind};
pub use crate::reconcile::{ReconciledDelta, SyncLane, SyncReconciler};
pub use crate::store::{LocalEntityStore, PendingQueueStore, SyncCursorStore};
pub use crate::task::{PendingTask, TaskKey};
pub use crate::upload::{
    Dispatched, Dispatcher, DrainStats, EntityLane, RetryPolicy, TaskHandler, UploadDrainLoop,
};
