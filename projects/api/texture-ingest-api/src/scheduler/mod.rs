//! A pool of background threads transcoding Basis blobs.
//!
//! # Dispatch
//!
//! [`TranscodeScheduler::submit`] fills the pool up to [`SchedulerConfig::worker_count`] live
//! workers, then hands the request to the live worker with the fewest requests in flight
//! (ties go to the older worker). Requests are tagged with an id from a per-scheduler counter.
//!
//! # Correlation
//!
//! Workers never touch scheduler state. They answer on a single response queue drained by a
//! router thread, which matches responses to pending requests by id, updates load counters
//! and retires workers that fail to initialize or exit. Every request assigned to a retired
//! worker is rejected with a [`WorkerError`].
//!
//! # Inline mode
//!
//! With `worker_count == 0`, or when no thread can be spawned, requests are transcoded on
//! the calling thread with the same fallback ladder.

mod protocol;
mod worker;

use self::protocol::{TranscodeRequest, WorkerRequest, WorkerResponse};
use crate::error::{SchedulerError, WorkerError};
use crate::transcoder_source::TranscoderBinary;
use crossbeam_channel::{Receiver, Sender};
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use texture_ingest_basis::{
    transcode_basis, BasisFormat, TranscodedSet, TranscoderModule, TranscoderModuleFactory,
};
use tracing::{debug, trace, warn};

/// Worker pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of worker threads. `0` transcodes on the calling thread.
    pub worker_count: usize,
}

impl SchedulerConfig {
    /// Default upper bound on worker threads.
    pub const MAX_DEFAULT_WORKERS: usize = 4;

    /// Transcode on the calling thread only.
    pub const fn inline() -> Self {
        Self { worker_count: 0 }
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }
}

impl Default for SchedulerConfig {
    /// One worker per available core, at most [`SchedulerConfig::MAX_DEFAULT_WORKERS`].
    fn default() -> Self {
        let cores = thread::available_parallelism().map_or(1, |cores| cores.get());
        Self {
            worker_count: cores.min(Self::MAX_DEFAULT_WORKERS),
        }
    }
}

/// Lifecycle of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Thread started; transcoder binary and module not loaded yet.
    Initializing,
    /// Module loaded; serving requests.
    Ready,
    /// Module failed to load. Never dispatched to again.
    Failed,
    /// Thread exited.
    Terminated,
}

impl WorkerState {
    /// Whether new requests may be dispatched to a worker in this state.
    pub const fn is_live(self) -> bool {
        matches!(self, WorkerState::Initializing | WorkerState::Ready)
    }
}

/// Diagnostics for one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: usize,
    pub state: WorkerState,
    /// Requests dispatched and not yet answered.
    pub load: usize,
    /// Requests dispatched over the worker's lifetime.
    pub dispatched: u64,
}

/// Snapshot of the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Requests are transcoded on the calling thread.
    pub inline: bool,
    /// Workers in pool order. Terminated workers are pruned on the next dispatch.
    pub workers: Vec<WorkerStats>,
    /// Requests awaiting a response.
    pub pending: usize,
}

type ReadyResult = Result<(), WorkerError>;
type WorkerReady = Shared<oneshot::Receiver<ReadyResult>>;
type TranscodeResult = Result<TranscodedSet, SchedulerError>;

struct WorkerSlot {
    id: usize,
    state: WorkerState,
    load: usize,
    dispatched: u64,
    requests: Option<Sender<WorkerRequest>>,
    ready: WorkerReady,
    ready_sender: Option<oneshot::Sender<ReadyResult>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerSlot {
    fn stats(&self) -> WorkerStats {
        WorkerStats {
            id: self.id,
            state: self.state,
            load: self.load,
            dispatched: self.dispatched,
        }
    }

    fn resolve_ready(&mut self, result: ReadyResult) {
        if let Some(sender) = self.ready_sender.take() {
            let _ = sender.send(result);
        }
    }
}

struct PendingRequest {
    worker: usize,
    respond: oneshot::Sender<TranscodeResult>,
}

#[derive(Default)]
struct PoolState {
    workers: Vec<WorkerSlot>,
    pending: HashMap<u64, PendingRequest>,
    next_worker_id: usize,
    inline: bool,
    shut_down: bool,
}

impl PoolState {
    fn slot_mut(&mut self, worker: usize) -> Option<&mut WorkerSlot> {
        self.workers.iter_mut().find(|slot| slot.id == worker)
    }

    fn live_workers(&self) -> usize {
        self.workers
            .iter()
            .filter(|slot| slot.state.is_live())
            .count()
    }

    /// The live worker with the lowest load; ties go to the earliest in pool order.
    fn least_loaded(&self) -> Option<usize> {
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state.is_live())
            .min_by_key(|(_, slot)| slot.load)
            .map(|(index, _)| index)
    }

    /// Applies one worker response. Called by the router thread.
    fn handle(&mut self, response: WorkerResponse) {
        match response {
            WorkerResponse::Init { worker, result } => {
                let Some(slot) = self.slot_mut(worker) else {
                    return;
                };
                match result {
                    Ok(()) => {
                        slot.state = WorkerState::Ready;
                        slot.resolve_ready(Ok(()));
                    }
                    Err(error) => {
                        warn!(%error, worker, "Transcode worker failed to initialize");
                        slot.state = WorkerState::Failed;
                        slot.requests = None;
                        slot.resolve_ready(Err(error.clone()));
                        self.reject_worker(worker, error);
                    }
                }
            }
            WorkerResponse::Transcode {
                worker,
                request_id,
                result,
            } => {
                let Some(pending) = self.pending.remove(&request_id) else {
                    warn!(worker, request_id, "Dropping response for unknown request");
                    return;
                };
                if let Some(slot) = self.slot_mut(pending.worker) {
                    slot.load = slot.load.saturating_sub(1);
                }
                let _ = pending.respond.send(result.map_err(SchedulerError::from));
            }
            WorkerResponse::Exited { worker } => {
                let shut_down = self.shut_down;
                if let Some(slot) = self.slot_mut(worker) {
                    if slot.state.is_live() && !shut_down {
                        warn!(worker, "Transcode worker exited unexpectedly");
                    }
                }
                self.retire(worker);
            }
        }
    }

    /// Marks `worker` terminated and rejects everything assigned to it.
    fn retire(&mut self, worker: usize) {
        if let Some(slot) = self.slot_mut(worker) {
            slot.state = WorkerState::Terminated;
            slot.requests = None;
            slot.resolve_ready(Err(WorkerError::Terminated { worker }));
        }
        self.reject_worker(worker, WorkerError::Terminated { worker });
    }

    /// Rejects every request still assigned to `worker`.
    fn reject_worker(&mut self, worker: usize, error: WorkerError) {
        let orphaned: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.worker == worker)
            .map(|(&request_id, _)| request_id)
            .collect();

        for request_id in orphaned {
            if let Some(pending) = self.pending.remove(&request_id) {
                debug!(worker, request_id, "Rejecting request of retired worker");
                let _ = pending.respond.send(Err(error.clone().into()));
            }
        }
        if let Some(slot) = self.slot_mut(worker) {
            slot.load = 0;
        }
    }

    /// Joins and removes terminated workers.
    fn prune_terminated(&mut self) {
        self.workers.retain_mut(|slot| {
            if slot.state != WorkerState::Terminated {
                return true;
            }
            if let Some(thread) = slot.thread.take() {
                let _ = thread.join();
            }
            false
        });
    }
}

fn route_responses(pool: Arc<Mutex<PoolState>>, responses: Receiver<WorkerResponse>) {
    for response in responses.iter() {
        pool.lock().handle(response);
    }
}

/// A transcode submitted to a [`TranscodeScheduler`].
///
/// Resolves once the assigned worker is ready and has answered. Dropping it does not cancel
/// the transcode.
#[must_use = "a pending transcode does nothing unless awaited"]
pub struct PendingTranscode {
    request_id: Option<u64>,
    worker: Option<usize>,
    result: BoxFuture<'static, TranscodeResult>,
}

impl PendingTranscode {
    fn completed(result: TranscodeResult) -> Self {
        Self {
            request_id: None,
            worker: None,
            result: future::ready(result).boxed(),
        }
    }

    fn dispatched(
        request_id: u64,
        worker: usize,
        ready: WorkerReady,
        response: oneshot::Receiver<TranscodeResult>,
    ) -> Self {
        let disconnected = move |_| SchedulerError::Worker(WorkerError::Disconnected { worker });
        let result = async move {
            ready.await.map_err(disconnected)??;
            response.await.map_err(disconnected)?
        };
        Self {
            request_id: Some(request_id),
            worker: Some(worker),
            result: result.boxed(),
        }
    }

    /// Correlation id, or `None` when the request was handled inline.
    pub fn request_id(&self) -> Option<u64> {
        self.request_id
    }

    /// Worker the request was dispatched to, or `None` when handled inline.
    pub fn worker(&self) -> Option<usize> {
        self.worker
    }
}

impl Future for PendingTranscode {
    type Output = TranscodeResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.result.as_mut().poll(cx)
    }
}

/// Transcodes Basis blobs on a pool of worker threads.
///
/// Dropping the scheduler closes every worker queue and joins all threads.
pub struct TranscodeScheduler {
    config: SchedulerConfig,
    factory: Arc<dyn TranscoderModuleFactory>,
    binary: Arc<TranscoderBinary>,
    pool: Arc<Mutex<PoolState>>,
    responses: Option<Sender<WorkerResponse>>,
    router: Option<JoinHandle<()>>,
    next_request_id: AtomicU64,
    inline_module: Mutex<Option<Box<dyn TranscoderModule>>>,
}

impl TranscodeScheduler {
    pub fn new(
        config: SchedulerConfig,
        factory: Arc<dyn TranscoderModuleFactory>,
        binary: Arc<TranscoderBinary>,
    ) -> Self {
        let pool = Arc::new(Mutex::new(PoolState::default()));
        let mut scheduler = Self {
            config,
            factory,
            binary,
            pool: Arc::clone(&pool),
            responses: None,
            router: None,
            next_request_id: AtomicU64::new(1),
            inline_module: Mutex::new(None),
        };

        if config.worker_count == 0 {
            pool.lock().inline = true;
            return scheduler;
        }

        let (sender, receiver) = crossbeam_channel::unbounded();
        let spawned = thread::Builder::new()
            .name("texture-ingest-router".into())
            .spawn(move || route_responses(pool, receiver));
        match spawned {
            Ok(router) => {
                scheduler.responses = Some(sender);
                scheduler.router = Some(router);
            }
            Err(error) => {
                warn!(%error, "Failed to spawn response router, transcoding inline");
                scheduler.pool.lock().inline = true;
            }
        }
        scheduler
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Transcodes `blob`, retrying once on another worker if the first one fails.
    ///
    /// `with_alpha` is used for blobs with alpha, `no_alpha` for the rest.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::Transcode`] if transcoding failed, fallback ladder included.
    /// - [`SchedulerError::Worker`] if workers failed twice in a row.
    /// - [`SchedulerError::ShutDown`] if the scheduler is shutting down.
    pub async fn transcode(
        &self,
        blob: Arc<[u8]>,
        with_alpha: BasisFormat,
        no_alpha: BasisFormat,
    ) -> Result<TranscodedSet, SchedulerError> {
        match self.submit(Arc::clone(&blob), with_alpha, no_alpha).await {
            Err(SchedulerError::Worker(error)) => {
                warn!(%error, "Transcode worker failed, retrying once");
                self.submit(blob, with_alpha, no_alpha).await
            }
            result => result,
        }
    }

    /// Dispatches `blob` to a worker without retrying.
    ///
    /// Worker selection happens before this returns. In inline mode the transcode itself
    /// also completes before this returns.
    pub fn submit(
        &self,
        blob: Arc<[u8]>,
        with_alpha: BasisFormat,
        no_alpha: BasisFormat,
    ) -> PendingTranscode {
        let mut pool = self.pool.lock();
        if pool.shut_down {
            return PendingTranscode::completed(Err(SchedulerError::ShutDown));
        }
        if !pool.inline {
            self.fill_pool(&mut pool);
        }

        let Some(index) = pool.least_loaded() else {
            drop(pool);
            return PendingTranscode::completed(self.transcode_inline(&blob, with_alpha, no_alpha));
        };

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (respond, response) = oneshot::channel();
        let slot = &mut pool.workers[index];
        let worker = slot.id;

        let request = WorkerRequest::Transcode(TranscodeRequest {
            request_id,
            basis_data: blob,
            rgba_format: with_alpha,
            rgb_format: no_alpha,
        });
        let sent = slot
            .requests
            .as_ref()
            .is_some_and(|requests| requests.send(request).is_ok());
        if !sent {
            // The queue closed before the router saw the worker exit. Retire it now so a
            // retry lands on another worker.
            debug!(worker, "Transcode worker queue already closed");
            pool.retire(worker);
            self.fill_pool(&mut pool);
            return PendingTranscode::completed(Err(WorkerError::Disconnected { worker }.into()));
        }

        slot.load += 1;
        slot.dispatched += 1;
        let ready = slot.ready.clone();
        pool.pending
            .insert(request_id, PendingRequest { worker, respond });
        trace!(request_id, worker, "Dispatched transcode");

        PendingTranscode::dispatched(request_id, worker, ready, response)
    }

    /// Spawns workers until `worker_count` are live. Switches to inline mode if the pool is
    /// empty and no thread can be spawned.
    fn fill_pool(&self, pool: &mut PoolState) {
        let Some(responses) = &self.responses else {
            pool.inline = true;
            return;
        };
        pool.prune_terminated();

        while pool.live_workers() < self.config.worker_count {
            let id = pool.next_worker_id;
            let (requests, queue) = crossbeam_channel::unbounded();
            let (ready_sender, ready) = oneshot::channel();

            let thread = match worker::spawn_worker(
                id,
                Arc::clone(&self.factory),
                queue,
                responses.clone(),
            ) {
                Ok(thread) => thread,
                Err(error) => {
                    if pool.live_workers() == 0 {
                        warn!(%error, "Failed to spawn transcode worker, transcoding inline");
                        pool.inline = true;
                    } else {
                        warn!(%error, "Failed to spawn transcode worker");
                    }
                    return;
                }
            };

            // The queue is unbounded and its receiver alive, so this cannot fail.
            let _ = requests.send(WorkerRequest::Init {
                binary: Arc::clone(&self.binary),
            });
            pool.next_worker_id += 1;
            pool.workers.push(WorkerSlot {
                id,
                state: WorkerState::Initializing,
                load: 0,
                dispatched: 0,
                requests: Some(requests),
                ready: ready.shared(),
                ready_sender: Some(ready_sender),
                thread: Some(thread),
            });
            debug!(worker = id, "Spawned transcode worker");
        }
    }

    fn transcode_inline(
        &self,
        blob: &[u8],
        with_alpha: BasisFormat,
        no_alpha: BasisFormat,
    ) -> TranscodeResult {
        let mut slot = self.inline_module.lock();
        let instance = match slot.take() {
            Some(instance) => instance,
            None => self.instantiate_inline()?,
        };
        let module = slot.insert(instance);
        Ok(transcode_basis(&**module, blob, with_alpha, no_alpha)?)
    }

    fn instantiate_inline(&self) -> Result<Box<dyn TranscoderModule>, WorkerError> {
        let failed = |reason: String| WorkerError::InlineInitializationFailed(reason);
        let payload = block_on(self.binary.get()).map_err(|error| failed(error.to_string()))?;
        let module = self
            .factory
            .instantiate(&payload)
            .map_err(|error| failed(error.to_string()))?;
        debug!("Initialized inline transcoder");
        Ok(module)
    }

    pub fn stats(&self) -> SchedulerStats {
        let pool = self.pool.lock();
        SchedulerStats {
            inline: pool.inline,
            workers: pool.workers.iter().map(WorkerSlot::stats).collect(),
            pending: pool.pending.len(),
        }
    }
}

impl Drop for TranscodeScheduler {
    fn drop(&mut self) {
        let threads: Vec<JoinHandle<()>> = {
            let mut pool = self.pool.lock();
            pool.shut_down = true;
            pool.workers
                .iter_mut()
                .filter_map(|slot| {
                    slot.requests = None;
                    slot.thread.take()
                })
                .collect()
        };
        for thread in threads {
            let _ = thread.join();
        }

        // The router stops once the last response sender is gone.
        self.responses = None;
        if let Some(router) = self.router.take() {
            let _ = router.join();
        }
    }
}

#[cfg(test)]
mod tests;
