// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::DataKind;

/// Errors raised by the upload queue, the reconciler and their collaborators.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote service failed or could not be reached.
    #[error("remote error: {message}")]
    Remote {
        /// Error message.
        message: String,
        /// Whether the same request may succeed later.
        retryable: bool,
    },

    /// The remote service does not know the entity.
    #[error("{kind} {id} not found on remote")]
    NotFound {
        /// Data kind of the entity.
        kind: DataKind,
        /// Identifier of the entity.
        id: String,
    },

    /// Local storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A payload could not be decoded, or a delta is malformed.
    #[error("decode error: {0}")]
    Decode(String),

    /// No gateway or store is registered for the data kind.
    #[error("no handler registered for {0}")]
    Unsupported(DataKind),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Creates a retryable remote error.
    pub fn remote_retryable(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable remote error.
    pub fn remote_fatal(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error is expected to clear up on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Remote { retryable, .. } => *retryable,
            SyncError::Storage(_) => true,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for SyncError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(format!("Failed to run migrations: {e}"))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
