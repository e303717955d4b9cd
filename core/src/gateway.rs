// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Remote collaborators. Timeouts and authentication are their concern.

use async_trait::async_trait;

use crate::{Entity, SyncCursor, SyncDelta, SyncError};

/// Performs remote mutations of one entity kind.
#[async_trait]
pub trait RemoteMutationGateway<T: Entity>: Send + Sync {
    /// Creates the entity remotely and returns the server's copy.
    async fn create(&self, entity: &T) -> Result<T, SyncError>;

    /// Updates the entity remotely and returns the server's copy.
    ///
    /// Fails with [`SyncError::NotFound`] if the server does not know the entity.
    async fn update(&self, entity: &T) -> Result<T, SyncError>;

    /// Deletes the entity remotely.
    async fn delete(&self, id: &str) -> Result<(), SyncError>;
}

/// Fetches remote changes of one entity kind.
#[async_trait]
pub trait RemoteQueryGateway<T: Entity>: Send + Sync {
    /// Fetches the changes after `cursor`, or everything if `full` is set.
    async fn fetch_delta(
        &self,
        cursor: Option<&SyncCursor>,
        full: bool,
    ) -> Result<SyncDelta<T>, SyncError>;
}
