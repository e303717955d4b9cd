// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Scripted remote gateways that record every call.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use calsync_core::{
    Entity, RemoteMutationGateway, RemoteQueryGateway, SyncCursor, SyncDelta, SyncError,
};
use tokio::sync::Semaphore;

/// One remote mutation as seen by a [`RecordingGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub id: String,
    pub ok: bool,
}

impl Call {
    pub fn ok(op: &'static str, id: &str) -> Self {
        Self {
            op,
            id: id.to_string(),
            ok: true,
        }
    }

    pub fn failed(op: &'static str, id: &str) -> Self {
        Self {
            op,
            id: id.to_string(),
            ok: false,
        }
    }
}

type Stamp<T> = Box<dyn Fn(T) -> T + Send + Sync>;

/// An in-memory remote service with failure injection and an optional gate that holds every
/// call until a permit is added.
pub struct RecordingGateway<T> {
    remote: Mutex<BTreeMap<String, T>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<String, usize>>,
    gate: Option<Arc<Semaphore>>,
    stamp: Option<Stamp<T>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[allow(dead_code)]
impl<T: Entity> RecordingGateway<T> {
    pub fn new() -> Self {
        Self {
            remote: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            gate: None,
            stamp: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Seeds the remote state.
    pub fn with_remote(self, entities: impl IntoIterator<Item = T>) -> Self {
        {
            let mut remote = self.remote.lock().unwrap();
            for e in entities {
                remote.insert(e.id().to_string(), e);
            }
        }
        self
    }

    /// Holds every call until the semaphore hands out a permit.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Transforms every entity the server stores, like a server assigning fields.
    pub fn with_stamp(mut self, stamp: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        self.stamp = Some(Box::new(stamp));
        self
    }

    /// Fails the next `n` calls touching `id`.
    pub fn fail_next(&self, id: &str, n: usize) {
        self.failures.lock().unwrap().insert(id.to_string(), n);
    }

    /// Fails every call touching `id`.
    pub fn fail_always(&self, id: &str) {
        self.fail_next(id, usize::MAX);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remote(&self) -> Vec<T> {
        self.remote.lock().unwrap().values().cloned().collect()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn begin(&self, op: &'static str, id: &str) -> Result<InFlight<'_>, SyncError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let injected = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(id) {
                Some(n) if *n > 0 => {
                    *n = n.saturating_sub(1);
                    true
                }
                _ => false,
            }
        };
        if injected {
            self.record(Call::failed(op, id));
            return Err(SyncError::remote_retryable(format!("injected {op} failure for {id}")));
        }

        Ok(guard)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn store(&self, entity: &T) -> T {
        let stored = match &self.stamp {
            Some(stamp) => stamp(entity.clone()),
            None => entity.clone(),
        };
        let mut remote = self.remote.lock().unwrap();
        remote.insert(stored.id().to_string(), stored.clone());
        stored
    }
}

#[async_trait]
impl<T: Entity> RemoteMutationGateway<T> for RecordingGateway<T> {
    async fn create(&self, entity: &T) -> Result<T, SyncError> {
        let _guard = self.begin("create", entity.id()).await?;
        self.record(Call::ok("create", entity.id()));
        Ok(self.store(entity))
    }

    async fn update(&self, entity: &T) -> Result<T, SyncError> {
        let _guard = self.begin("update", entity.id()).await?;
        let known = self.remote.lock().unwrap().contains_key(entity.id());
        if !known {
            self.record(Call::failed("update", entity.id()));
            return Err(SyncError::NotFound {
                kind: T::KIND,
                id: entity.id().to_string(),
            });
        }

        self.record(Call::ok("update", entity.id()));
        Ok(self.store(entity))
    }

    async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let _guard = self.begin("delete", id).await?;
        self.record(Call::ok("delete", id));
        self.remote.lock().unwrap().remove(id);
        Ok(())
    }
}

/// A query gateway answering from a queue of scripted responses.
///
/// Once the script runs out every request answers "no change".
pub struct ScriptedQueryGateway<T> {
    responses: Mutex<VecDeque<Result<SyncDelta<T>, SyncError>>>,
    requests: Mutex<Vec<(Option<SyncCursor>, bool)>>,
}

#[allow(dead_code)]
impl<T: Entity> ScriptedQueryGateway<T> {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, delta: SyncDelta<T>) {
        self.responses.lock().unwrap().push_back(Ok(delta));
    }

    pub fn fail(&self, err: SyncError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Every request as `(cursor, full)`.
    pub fn requests(&self) -> Vec<(Option<SyncCursor>, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Entity> RemoteQueryGateway<T> for ScriptedQueryGateway<T> {
    async fn fetch_delta(
        &self,
        cursor: Option<&SyncCursor>,
        full: bool,
    ) -> Result<SyncDelta<T>, SyncError> {
        self.requests.lock().unwrap().push((cursor.copied(), full));
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(SyncDelta::no_change(None)))
    }
}
