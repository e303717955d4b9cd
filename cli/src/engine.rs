// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::sync::Arc;

use calsync_core::localdb::LocalDb;
use calsync_core::{
    Config as CoreConfig, DoneTodo, DoneTodoDetail, Dispatcher, Entity, EntityLane, EventDetail,
    RetryPolicy, Schedule, SyncLane, SyncReconciler, Tag, Todo, UploadDrainLoop,
};
use calsync_http::{HttpClient, RemoteConfig, RestGateway};

/// The local state database wired to the configured remote.
#[derive(Debug)]
pub struct Engine {
    db: LocalDb,
    config: CoreConfig,
    http: Option<Arc<HttpClient>>,
}

impl Engine {
    /// Opens the state database described by `config`.
    ///
    /// Without a `remote` only the queue and cursor inspection commands work.
    pub async fn open(
        mut config: CoreConfig,
        remote: Option<RemoteConfig>,
    ) -> Result<Self, Box<dyn Error>> {
        config.normalize()?;
        let db = LocalDb::open(config.db_path().as_deref()).await?;
        let http = match remote {
            Some(remote) => Some(Arc::new(HttpClient::new(remote)?)),
            None => None,
        };
        Ok(Self { db, config, http })
    }

    /// The state database.
    pub fn db(&self) -> &LocalDb {
        &self.db
    }

    /// A drain loop over the durable queue, with a lane for every data kind.
    pub fn drain_loop(&self) -> Result<UploadDrainLoop, Box<dyn Error>> {
        let http = self.http()?;
        let dispatcher = Dispatcher::new()
            .with_lane(self.lane::<Tag>(&http))
            .with_lane(self.lane::<Todo>(&http))
            .with_lane(self.lane::<Schedule>(&http))
            .with_lane(self.lane::<EventDetail>(&http))
            .with_lane(self.lane::<DoneTodo>(&http))
            .with_lane(self.lane::<DoneTodoDetail>(&http));

        let policy = RetryPolicy::from(&self.config.upload);
        Ok(UploadDrainLoop::new(
            Arc::new(self.db.pending_tasks.clone()),
            dispatcher,
            policy,
        ))
    }

    /// A reconciler over the stored cursors, with a lane for every syncable kind.
    pub fn reconciler(&self) -> Result<SyncReconciler, Box<dyn Error>> {
        let http = self.http()?;
        Ok(SyncReconciler::new(Arc::new(self.db.sync_cursors.clone()))
            .with_tags(self.sync_lane::<Tag>(&http))
            .with_todos(self.sync_lane::<Todo>(&http))
            .with_schedules(self.sync_lane::<Schedule>(&http)))
    }

    /// Close the state database.
    pub async fn close(self) -> Result<(), Box<dyn Error>> {
        self.db.close().await?;
        Ok(())
    }

    fn http(&self) -> Result<Arc<HttpClient>, Box<dyn Error>> {
        self.http
            .clone()
            .ok_or_else(|| "No [remote] table in the configuration".into())
    }

    fn lane<T: Entity>(&self, http: &Arc<HttpClient>) -> EntityLane<T> {
        EntityLane::<T>::new(
            Arc::new(self.db.entities::<T>()),
            Arc::new(RestGateway::<T>::new(http.clone())),
        )
        .with_mirror(self.config.upload.mirror_remote)
    }

    fn sync_lane<T: Entity>(&self, http: &Arc<HttpClient>) -> SyncLane<T> {
        SyncLane::<T>::new(
            Arc::new(RestGateway::<T>::new(http.clone())),
            Arc::new(self.db.entities::<T>()),
        )
    }
}
