// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! REST gateway for one entity type.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use calsync_core::{
    DataKind, Entity, RemoteMutationGateway, RemoteQueryGateway, SyncCursor, SyncDelta, SyncError,
};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::HttpError;
use crate::http::HttpClient;
use crate::wire::DeltaBody;

/// The path segment under `/v1` serving `kind`.
pub fn resource_name(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Tag => "tags",
        DataKind::Todo => "todos",
        DataKind::Schedule => "schedules",
        DataKind::EventDetail => "event-details",
        DataKind::DoneTodo => "done-todos",
        DataKind::DoneTodoDetail => "done-todo-details",
    }
}

/// Delivers and fetches entities of type `T` over REST.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use calsync_core::Todo;
/// use calsync_http::{HttpClient, RemoteConfig, RestGateway};
///
/// let http = Arc::new(HttpClient::new(RemoteConfig {
///     base_url: "https://sync.example.com".to_string(),
///     ..Default::default()
/// })?);
/// let todos = RestGateway::<Todo>::new(http);
/// ```
pub struct RestGateway<T> {
    http: Arc<HttpClient>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> RestGateway<T> {
    /// Creates a gateway sharing `http` with the other gateways of the same remote.
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            _entity: PhantomData,
        }
    }

    fn resource() -> &'static str {
        resource_name(T::KIND)
    }

    async fn send_entity(&self, method: Method, entity: &T) -> Result<T, HttpError> {
        let url = if method == Method::POST {
            self.http.url(&[Self::resource()])
        } else {
            self.http.url(&[Self::resource(), entity.id()])
        };
        let req = self.http.build_request(method, url).json(entity);
        let resp = self.http.execute(req).await?;
        decode(resp).await
    }
}

impl<T> Clone for RestGateway<T> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for RestGateway<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestGateway")
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

async fn decode<B: DeserializeOwned>(resp: Response) -> Result<B, HttpError> {
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| HttpError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl<T: Entity> RemoteMutationGateway<T> for RestGateway<T> {
    #[tracing::instrument(skip_all, fields(kind = %T::KIND, id = entity.id()))]
    async fn create(&self, entity: &T) -> Result<T, SyncError> {
        let created = self
            .send_entity(Method::POST, entity)
            .await
            .map_err(|e| e.into_sync(T::KIND, entity.id()))?;
        tracing::debug!("created on remote");
        Ok(created)
    }

    #[tracing::instrument(skip_all, fields(kind = %T::KIND, id = entity.id()))]
    async fn update(&self, entity: &T) -> Result<T, SyncError> {
        let updated = self
            .send_entity(Method::PUT, entity)
            .await
            .map_err(|e| e.into_sync(T::KIND, entity.id()))?;
        tracing::debug!("updated on remote");
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(kind = %T::KIND))]
    async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let url = self.http.url(&[Self::resource(), id]);
        let req = self.http.build_request(Method::DELETE, url);
        match self.http.execute(req).await {
            Ok(_) => Ok(()),
            Err(HttpError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                tracing::debug!("already gone on remote");
                Ok(())
            }
            Err(e) => Err(e.into_sync(T::KIND, id)),
        }
    }
}

#[async_trait]
impl<T: Entity> RemoteQueryGateway<T> for RestGateway<T> {
    #[tracing::instrument(skip(self), fields(kind = %T::KIND))]
    async fn fetch_delta(
        &self,
        cursor: Option<&SyncCursor>,
        full: bool,
    ) -> Result<SyncDelta<T>, SyncError> {
        let kind = T::KIND.syncable().ok_or(SyncError::Unsupported(T::KIND))?;

        let mut url = self.http.url(&[Self::resource(), "sync"]);
        if full {
            url.query_pairs_mut().append_pair("full", "true");
        } else if let Some(cursor) = cursor {
            url.query_pairs_mut()
                .append_pair("since", &cursor.timestamp_value.to_string());
        }

        let req = self.http.build_request(Method::GET, url);
        let resp = self.http.execute(req).await?;
        let body: DeltaBody<T> = decode(resp).await?;
        Ok(body.into_delta(kind))
    }
}
