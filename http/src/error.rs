// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use calsync_core::{DataKind, SyncError};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the REST gateways.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body is not what the service promises.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl HttpError {
    /// Whether the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            HttpError::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
            }
            HttpError::InvalidResponse(_) | HttpError::Config(_) => false,
        }
    }

    /// Converts into a [`SyncError`] about the entity `id` of `kind`.
    pub fn into_sync(self, kind: DataKind, id: &str) -> SyncError {
        match self {
            HttpError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                SyncError::NotFound {
                    kind,
                    id: id.to_string(),
                }
            }
            other => other.into(),
        }
    }
}

impl From<HttpError> for SyncError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Request(ref inner) if inner.is_decode() => SyncError::Decode(e.to_string()),
            HttpError::InvalidResponse(msg) => SyncError::Decode(msg),
            HttpError::Config(msg) => SyncError::Config(msg),
            e if e.is_retryable() => SyncError::remote_retryable(e.to_string()),
            e => SyncError::remote_fatal(e.to_string()),
        }
    }
}
