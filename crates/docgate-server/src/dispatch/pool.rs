//! Bounded worker pool for backend calls.
//!
//! A fixed number of worker tasks pull [`WorkItem`]s from one FIFO queue,
//! so at most `workers` backend calls are in flight and the rest wait in
//! submission order. Submission never blocks and never rejects work.
//!
//! A submitted item always runs to completion: if the caller stops
//! waiting, the result is computed anyway and then discarded. The same
//! holds after a timeout: the caller gets [`ExtractError::Timeout`] right
//! away, but the worker stays busy until the backend call returns, so the
//! bound also covers parses still running on the blocking pool.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use docgate_extractors::{
    BackendKind, ExtractError, ExtractionRequest, ExtractionResult, Extractor,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default number of concurrent backend calls.
pub const DEFAULT_WORKERS: usize = 10;

/// One unit of backend work.
///
/// Owns the request until a worker moves it into the backend task.
pub struct WorkItem {
    id: Uuid,
    request: ExtractionRequest,
    extractor: Arc<dyn Extractor>,
    reply: oneshot::Sender<ExtractionResult>,
    enqueued_at: Instant,
}

/// Completion handle for a submitted [`WorkItem`].
pub struct WorkHandle {
    id: Uuid,
    receiver: oneshot::Receiver<ExtractionResult>,
}

impl WorkHandle {
    /// Identifier shared with the worker's log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the worker to deliver the result.
    pub async fn wait(self) -> ExtractionResult {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(ExtractError::internal("worker dropped the result")))
    }
}

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub workers: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub completed: u64,
}

#[derive(Default)]
struct Counters {
    queued: AtomicUsize,
    in_flight: AtomicUsize,
    completed: AtomicU64,
}

/// Fixed-size pool executing extractor calls.
///
/// Cloning is cheap and every clone feeds the same queue. Workers exit
/// once the last clone is dropped and the queue is drained.
#[derive(Clone)]
pub struct WorkerPool {
    sender: mpsc::UnboundedSender<WorkItem>,
    counters: Arc<Counters>,
    workers: usize,
    timeout: Option<Duration>,
}

impl WorkerPool {
    /// Start `workers` worker tasks on the current tokio runtime.
    ///
    /// `timeout` bounds each unit of work; `None` lets calls run forever.
    pub fn new(workers: usize, timeout: Option<Duration>) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let counters = Arc::new(Counters::default());

        for worker in 0..workers {
            tokio::spawn(run_worker(
                worker,
                Arc::clone(&receiver),
                Arc::clone(&counters),
                timeout,
            ));
        }

        Self {
            sender,
            counters,
            workers,
            timeout,
        }
    }

    /// Queue a request for `extractor` and return its completion handle.
    pub fn submit(
        &self,
        request: ExtractionRequest,
        extractor: Arc<dyn Extractor>,
    ) -> Result<WorkHandle, ExtractError> {
        let (reply, receiver) = oneshot::channel();
        let id = Uuid::new_v4();

        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        let item = WorkItem {
            id,
            request,
            extractor,
            reply,
            enqueued_at: Instant::now(),
        };

        if self.sender.send(item).is_err() {
            self.counters.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(ExtractError::internal("worker pool is shut down"));
        }

        Ok(WorkHandle { id, receiver })
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Per-unit timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.workers,
            queued: self.counters.queued.load(Ordering::SeqCst),
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
        }
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<WorkItem>>>,
    counters: Arc<Counters>,
    timeout: Option<Duration>,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(item) = next else {
            debug!(worker, "Work queue closed, worker exiting");
            break;
        };

        let WorkItem {
            id,
            request,
            extractor,
            reply,
            enqueued_at,
        } = item;
        let backend = extractor.kind();

        counters.queued.fetch_sub(1, Ordering::SeqCst);
        counters.in_flight.fetch_add(1, Ordering::SeqCst);
        let queued_ms = enqueued_at.elapsed().as_millis() as u64;
        let started = Instant::now();

        let mut task = tokio::spawn(async move { extractor.extract(&request).await });

        let (result, overran) = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => (settle(joined, backend), false),
                Err(_) => (Err(ExtractError::Timeout(limit)), true),
            },
            None => (settle((&mut task).await, backend), false),
        };

        debug!(
            worker,
            request_id = %id,
            backend = %backend,
            queued_ms,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Work item finished"
        );

        if reply.send(result).is_err() {
            debug!(request_id = %id, "Caller went away, result discarded");
        }
        counters.completed.fetch_add(1, Ordering::SeqCst);

        // A timed-out call keeps its slot until the backend really stops,
        // including any parse still running on the blocking pool.
        if overran {
            let late = settle(task.await, backend);
            debug!(
                worker,
                request_id = %id,
                backend = %backend,
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = late.is_ok(),
                "Timed-out work item drained"
            );
        }

        counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Turn a finished extractor task into a result, reporting panics as errors.
fn settle(joined: Result<ExtractionResult, JoinError>, backend: BackendKind) -> ExtractionResult {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => {
            let panic = err.into_panic();
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(backend = %backend, %message, "Backend panicked");
            Err(ExtractError::internal(format!("backend panicked: {}", message)))
        }
        Err(err) => Err(ExtractError::internal(format!("backend task failed: {}", err))),
    }
}
