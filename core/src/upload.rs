// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Background delivery of queued local mutations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::UploadConfig;
use crate::{
    DataKind, Entity, LocalEntityStore, PendingQueueStore, PendingTask, RemoteMutationGateway,
    SyncError,
};

/// Retry and dead-letter policy of the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts after which a task is dead-lettered, 0 retries forever.
    pub max_failures: u32,
    /// Delay before the first retry.
    pub backoff_initial: Duration,
    /// Upper bound of the retry delay.
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        (&UploadConfig::default()).into()
    }
}

impl From<&UploadConfig> for RetryPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            backoff_initial: config.backoff_initial.0,
            backoff_max: config.backoff_max.0,
        }
    }
}

impl RetryPolicy {
    /// The delay before attempting a task that already failed `failure_count` times.
    pub fn delay_for(&self, failure_count: u32) -> Duration {
        if failure_count == 0 {
            return Duration::ZERO;
        }

        let factor = 1u32.checked_shl(failure_count - 1).unwrap_or(u32::MAX);
        self.backoff_initial
            .checked_mul(factor)
            .map_or(self.backoff_max, |d| d.min(self.backoff_max))
    }

    /// Returns true if a task with this many failures must not be retried.
    pub fn is_poisoned(&self, failure_count: u32) -> bool {
        self.max_failures > 0 && failure_count >= self.max_failures
    }
}

/// How a dispatched task finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The remote call succeeded.
    Delivered,
    /// The entity no longer exists locally, so there was nothing to push.
    Dropped,
}

/// Delivers tasks of one data kind.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Performs the remote call a task describes.
    async fn dispatch(&self, task: &PendingTask) -> Result<Dispatched, SyncError>;
}

/// The [`TaskHandler`] of one entity type: a local store paired with a remote gateway.
pub struct EntityLane<T: Entity> {
    local: Arc<dyn LocalEntityStore<T>>,
    remote: Arc<dyn RemoteMutationGateway<T>>,
    mirror: bool,
}

impl<T: Entity> EntityLane<T> {
    /// Creates a lane that mirrors remote results back into the local store.
    pub fn new(
        local: Arc<dyn LocalEntityStore<T>>,
        remote: Arc<dyn RemoteMutationGateway<T>>,
    ) -> Self {
        Self {
            local,
            remote,
            mirror: true,
        }
    }

    /// Sets whether the server's copy is written back after a push.
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    async fn push(&self, id: &str) -> Result<Dispatched, SyncError> {
        let Some(entity) = self.local.load(id).await? else {
            return Ok(Dispatched::Dropped);
        };

        let remote = match self.remote.update(&entity).await {
            Err(SyncError::NotFound { .. }) => {
                tracing::debug!(kind = %T::KIND, id, "entity unknown remotely, creating");
                self.remote.create(&entity).await?
            }
            result => result?,
        };

        if self.mirror {
            self.local.upsert(remote).await?;
        }
        Ok(Dispatched::Delivered)
    }
}

#[async_trait]
impl<T: Entity> TaskHandler for EntityLane<T> {
    async fn dispatch(&self, task: &PendingTask) -> Result<Dispatched, SyncError> {
        match task.is_removal {
            true => {
                self.remote.delete(&task.target_id).await?;
                Ok(Dispatched::Delivered)
            }
            false => self.push(&task.target_id).await,
        }
    }
}

/// Routes tasks to the handler registered for their data kind.
#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: HashMap<DataKind, Arc<dyn TaskHandler>>,
}

impl Dispatcher {
    /// Creates a dispatcher without handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the lane of an entity type, replacing any handler of its kind.
    pub fn with_lane<T: Entity>(self, lane: EntityLane<T>) -> Self {
        self.with_handler(T::KIND, Arc::new(lane))
    }

    /// Registers a handler for a data kind, replacing any previous one.
    pub fn with_handler(mut self, kind: DataKind, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Dispatches a task.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unsupported`] if no handler is registered for the task's kind.
    pub async fn dispatch(&self, task: &PendingTask) -> Result<Dispatched, SyncError> {
        match self.handlers.get(&task.data_kind) {
            Some(handler) => handler.dispatch(task).await,
            None => Err(SyncError::Unsupported(task.data_kind)),
        }
    }
}

/// Counters of what the drain loop did since it was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Tasks delivered remotely.
    pub delivered: u64,
    /// Failed attempts that put the task back into the queue.
    pub rescheduled: u64,
    /// Push tasks finished without a remote call because the entity was gone.
    pub dropped: u64,
    /// Tasks moved to the dead-letter list.
    pub quarantined: u64,
}

impl DrainStats {
    /// Number of tasks taken from the queue and dispatched, whatever the outcome.
    pub fn attempts(&self) -> u64 {
        self.delivered + self.rescheduled + self.dropped + self.quarantined
    }
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    rescheduled: AtomicU64,
    dropped: AtomicU64,
    quarantined: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DrainStats {
        DrainStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            rescheduled: self.rescheduled.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            quarantined: self.quarantined.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default)]
struct DrainState {
    unit: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

struct Inner {
    queue: Arc<dyn PendingQueueStore>,
    dispatcher: Dispatcher,
    policy: RetryPolicy,
    state: Mutex<DrainState>,
    draining: watch::Sender<bool>,
    live_units: watch::Sender<usize>,
    counters: Counters,
}

/// Counts a spawned drain unit until its future completes or is dropped.
struct LiveUnit(Arc<Inner>);

impl LiveUnit {
    fn new(inner: Arc<Inner>) -> Self {
        inner.live_units.send_modify(|n| *n += 1);
        Self(inner)
    }
}

impl Drop for LiveUnit {
    fn drop(&mut self) {
        self.0.live_units.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Drains a [`PendingQueueStore`] one task at a time in a background tokio task.
///
/// At most one drain unit dispatches per instance; a unit started after `pause` first waits for
/// the paused one to exit. `append`, `resume` and `pause` may be called concurrently; every flag
/// flip and every pop happens under one mutex. Cloning yields a handle
/// to the same loop.
#[derive(Clone)]
pub struct UploadDrainLoop {
    inner: Arc<Inner>,
}

impl UploadDrainLoop {
    /// Creates an idle loop.
    pub fn new(
        queue: Arc<dyn PendingQueueStore>,
        dispatcher: Dispatcher,
        policy: RetryPolicy,
    ) -> Self {
        let (draining, _) = watch::channel(false);
        let (live_units, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                queue,
                dispatcher,
                policy,
                state: Mutex::new(DrainState::default()),
                draining,
                live_units,
                counters: Counters::default(),
            }),
        }
    }

    /// Persists tasks, replacing queued tasks with the same key, then resumes draining.
    ///
    /// Returns once the tasks are stored; delivery happens in the background.
    #[tracing::instrument(skip_all, fields(count = tasks.len()))]
    pub async fn append(&self, tasks: Vec<PendingTask>) -> Result<(), SyncError> {
        let mut state = self.inner.state.lock().await;
        self.inner.queue.push_tasks(tasks).await?;
        self.resume_locked(&mut state);
        Ok(())
    }

    /// Starts draining unless a drain is already active.
    #[tracing::instrument(skip(self))]
    pub async fn resume(&self) {
        let mut state = self.inner.state.lock().await;
        self.resume_locked(&mut state);
    }

    fn resume_locked(&self, state: &mut DrainState) {
        let unit_alive = state.unit.as_ref().is_some_and(|unit| !unit.is_finished());
        if *self.inner.draining.borrow() && unit_alive {
            return;
        }

        // A cancelled unit may still be finishing its last task, the new one waits for it
        let previous = state.unit.take();
        let token = CancellationToken::new();
        state.cancel = Some(token.clone());
        self.inner.draining.send_replace(true);
        tracing::debug!("starting drain unit");
        let live = LiveUnit::new(Arc::clone(&self.inner));
        state.unit = Some(tokio::spawn(drain(live, token, previous)));
    }

    /// Asks the running drain unit to stop after its current task.
    ///
    /// A task taken from the queue but not delivered is put back before the unit exits.
    #[tracing::instrument(skip(self))]
    pub async fn pause(&self) {
        let state = self.inner.state.lock().await;
        if !*self.inner.draining.borrow() {
            return;
        }

        if let Some(token) = &state.cancel {
            token.cancel();
        }
        self.inner.draining.send_replace(false);
        tracing::debug!("drain unit cancelled");
    }

    /// Returns true while a drain unit is active.
    pub fn is_draining(&self) -> bool {
        *self.inner.draining.borrow()
    }

    /// Observes the drain activity flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.draining.subscribe()
    }

    /// Waits until no drain unit is active.
    pub async fn wait_until_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|draining| !*draining).await;
    }

    /// Waits until every drain unit has exited, including a paused one still finishing its task.
    pub async fn wait_until_stopped(&self) {
        let mut rx = self.inner.live_units.subscribe();
        let _ = rx.wait_for(|units| *units == 0).await;
    }

    /// Number of queued tasks, dead-lettered ones excluded.
    pub async fn pending_len(&self) -> Result<usize, SyncError> {
        self.inner.queue.len().await
    }

    /// What the loop did so far.
    pub fn stats(&self) -> DrainStats {
        self.inner.counters.snapshot()
    }
}

async fn drain(live: LiveUnit, token: CancellationToken, previous: Option<JoinHandle<()>>) {
    let inner = &live.0;

    // Never raced against `token`: dropping the handle would detach a unit still delivering.
    if let Some(previous) = previous {
        if let Err(e) = previous.await {
            tracing::error!(err = %e, "previous drain unit panicked");
        }
    }

    loop {
        let task = {
            let _state = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                state = inner.state.lock() => state,
            };
            if token.is_cancelled() {
                return;
            }

            match inner.queue.pop_task().await {
                Ok(Some(task)) => task,
                Ok(None) => {
                    tracing::debug!("upload queue drained");
                    inner.draining.send_replace(false);
                    return;
                }
                Err(e) => {
                    tracing::error!(err = %e, "failed to pop pending task, stop draining");
                    inner.draining.send_replace(false);
                    return;
                }
            }
        };

        let delay = inner.policy.delay_for(task.failure_count);
        if !delay.is_zero() {
            tokio::select! {
                _ = token.cancelled() => {
                    put_back(inner, task).await;
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        deliver(inner, task).await;

        if token.is_cancelled() {
            return;
        }
    }
}

async fn deliver(inner: &Inner, task: PendingTask) {
    let kind = task.data_kind;
    let id = task.target_id.as_str();
    match inner.dispatcher.dispatch(&task).await {
        Ok(Dispatched::Delivered) => {
            tracing::debug!(%kind, id, removal = task.is_removal, "task delivered");
            Counters::bump(&inner.counters.delivered);
        }
        Ok(Dispatched::Dropped) => {
            tracing::debug!(%kind, id, "entity missing locally, task dropped");
            Counters::bump(&inner.counters.dropped);
        }
        Err(err) => reschedule(inner, task, err).await,
    }
}

async fn reschedule(inner: &Inner, task: PendingTask, err: SyncError) {
    let task = task.rescheduled(Timestamp::now());
    let kind = task.data_kind;
    let id = task.target_id.clone();
    let failures = task.failure_count;

    if inner.policy.is_poisoned(failures) {
        tracing::warn!(
            %kind,
            %id,
            failures,
            err = %err,
            "task keeps failing, moving to dead-letter list"
        );
        match inner.queue.quarantine(task).await {
            Ok(()) => Counters::bump(&inner.counters.quarantined),
            Err(e) => tracing::error!(%kind, %id, err = %e, "failed to quarantine task"),
        }
        return;
    }

    tracing::warn!(
        %kind,
        %id,
        failures,
        retryable = err.is_retryable(),
        err = %err,
        "delivery failed, rescheduling"
    );
    match inner.queue.requeue(task).await {
        Ok(()) => Counters::bump(&inner.counters.rescheduled),
        Err(e) => tracing::error!(%kind, %id, err = %e, "failed to reschedule task"),
    }
}

async fn put_back(inner: &Inner, task: PendingTask) {
    let kind = task.data_kind;
    let id = task.target_id.clone();
    if let Err(e) = inner.queue.requeue(task).await {
        tracing::error!(%kind, %id, err = %e, "failed to put back task on pause");
    }
}
