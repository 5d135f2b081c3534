//! Care pool: dedicated OS threads that run service jobs.
//!
//! Each worker thread owns a single-threaded tokio runtime, so executor
//! latency never blocks the admission loop. Jobs arrive over a bounded
//! crossbeam channel; every finished job, completed or not, goes back to the
//! engine as a [`Command::ServiceFinished`].
//!
//! A panic inside the executor is caught and reported as
//! [`TaskStatus::Aborted`], so the doctor the job owned is always released.

use std::any::Any;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::core::engine::Command;
use crate::core::executor::{CareExecutor, ServiceJob, TaskStatus};
use crate::core::FacilityError;

/// A job the pool could not take. The job is handed back so the caller can
/// release what it owns.
#[derive(Debug, Error)]
pub enum PoolError {
    /// All queue slots are taken.
    #[error("care pool queue is full")]
    QueueFull(Box<ServiceJob>),
    /// The pool no longer accepts work.
    #[error("care pool has been shut down")]
    Shutdown(Box<ServiceJob>),
}

impl PoolError {
    /// The rejected job.
    #[must_use]
    pub fn into_job(self) -> ServiceJob {
        match self {
            Self::QueueFull(job) | Self::Shutdown(job) => *job,
        }
    }
}

/// Pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareStats {
    /// Worker threads.
    pub worker_count: usize,
    /// Jobs accepted.
    pub submitted: u64,
    /// Jobs running right now.
    pub active: u64,
    /// Jobs that ran to completion.
    pub completed: u64,
    /// Jobs that aborted.
    pub aborted: u64,
}

#[derive(Debug, Default)]
struct CareCounters {
    submitted: AtomicU64,
    active: AtomicU64,
    completed: AtomicU64,
    aborted: AtomicU64,
}

/// Fixed set of worker threads running service jobs.
pub struct CarePool<E: CareExecutor> {
    worker_count: usize,
    job_tx: Mutex<Option<Sender<ServiceJob>>>,
    counters: Arc<CareCounters>,
    shutdown: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    _executor: PhantomData<E>,
}

impl<E: CareExecutor> CarePool<E> {
    /// Spawn the worker threads.
    ///
    /// `min_workers` raises the thread count (one per doctor keeps every
    /// doctor servable at once); `queue_depth` bounds the hand-off channel.
    ///
    /// # Errors
    ///
    /// [`FacilityError::Configuration`] if the config is invalid or a thread
    /// cannot be spawned.
    pub fn new(
        config: &WorkerConfig,
        min_workers: usize,
        queue_depth: usize,
        executor: E,
        completions: UnboundedSender<Command>,
    ) -> Result<Self, FacilityError> {
        config.validate().map_err(FacilityError::Configuration)?;

        let worker_count = config.resolved_worker_count(min_workers);
        let (job_tx, job_rx) = bounded::<ServiceJob>(queue_depth.max(1));
        let counters = Arc::new(CareCounters::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let worker = spawn_worker(
                worker_id,
                job_rx.clone(),
                completions.clone(),
                Arc::clone(&counters),
                Arc::clone(&shutdown),
                executor.clone(),
                config.thread_stack_size,
            )
            .map_err(|e| FacilityError::Configuration(format!("failed to spawn care worker: {e}")))?;
            workers.push(worker);
        }

        info!(worker_count, queue_depth, "care pool started");

        Ok(Self {
            worker_count,
            job_tx: Mutex::new(Some(job_tx)),
            counters,
            shutdown,
            workers: Mutex::new(workers),
            _executor: PhantomData,
        })
    }

    /// Hand a job to a worker without blocking.
    ///
    /// # Errors
    ///
    /// [`PoolError::QueueFull`] or [`PoolError::Shutdown`], carrying the job.
    pub fn submit(&self, job: ServiceJob) -> Result<(), PoolError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::Shutdown(Box::new(job)));
        }
        let guard = self.job_tx.lock();
        let Some(job_tx) = guard.as_ref() else {
            return Err(PoolError::Shutdown(Box::new(job)));
        };
        match job_tx.try_send(job) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(job)) => {
                warn!(kind = job.kind(), doctor = %job.doctor().name, "care pool queue is full");
                Err(PoolError::QueueFull(Box::new(job)))
            }
            Err(TrySendError::Disconnected(job)) => Err(PoolError::Shutdown(Box::new(job))),
        }
    }

    /// Current pool statistics.
    #[must_use]
    pub fn stats(&self) -> CareStats {
        CareStats {
            worker_count: self.worker_count,
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            active: self.counters.active.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            aborted: self.counters.aborted.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting jobs and join the workers.
    ///
    /// Jobs already running finish; each worker gets two seconds to exit
    /// before it is detached.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("shutting down care pool");
        self.job_tx.lock().take();

        let mut workers = self.workers.lock();
        for (idx, worker) in workers.drain(..).enumerate() {
            let (tx, rx) = std::sync::mpsc::channel();
            let joiner = thread::spawn(move || {
                let result = worker.join();
                tx.send(result.is_ok()).ok();
            });
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(true) => debug!(worker_id = idx, "care worker joined"),
                Ok(false) => warn!(worker_id = idx, "care worker panicked"),
                Err(_) => warn!(worker_id = idx, "care worker did not exit in time, detaching"),
            }
            if joiner.is_finished() {
                joiner.join().ok();
            }
        }
        info!(worker_count = self.worker_count, "care pool shut down");
    }
}

impl<E: CareExecutor> Drop for CarePool<E> {
    fn drop(&mut self) {
        // unblock idle workers; running jobs are left to finish on their own
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.job_tx.lock().take();
            debug!("care pool dropped without shutdown, workers detached");
        }
    }
}

fn worker_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "executor panicked".to_string())
}

fn spawn_worker<E: CareExecutor>(
    worker_id: usize,
    job_rx: Receiver<ServiceJob>,
    completions: UnboundedSender<Command>,
    counters: Arc<CareCounters>,
    shutdown: Arc<AtomicBool>,
    executor: E,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("care-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            let mut rt = match worker_runtime() {
                Ok(rt) => rt,
                Err(e) => {
                    error!(worker_id, error = %e, "failed to create worker runtime");
                    return;
                }
            };
            debug!(worker_id, "care worker started");

            // recv fails once the sender is dropped at shutdown
            while let Ok(job) = job_rx.recv() {
                let status = if shutdown.load(Ordering::Acquire) {
                    TaskStatus::Aborted("care pool shut down".into())
                } else {
                    counters.active.fetch_add(1, Ordering::Relaxed);
                    debug!(worker_id, kind = job.kind(), doctor = %job.doctor().name, "job started");
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rt.block_on(executor.execute(&job))));
                    counters.active.fetch_sub(1, Ordering::Relaxed);
                    match outcome {
                        Ok(status) => status,
                        Err(payload) => {
                            let reason = panic_message(payload.as_ref());
                            error!(worker_id, kind = job.kind(), %reason, "executor panicked");
                            // the runtime may be left mid-poll; start a clean one
                            match worker_runtime() {
                                Ok(fresh) => rt = fresh,
                                Err(e) => {
                                    error!(worker_id, error = %e, "failed to rebuild worker runtime");
                                    completions
                                        .send(Command::ServiceFinished {
                                            job,
                                            status: TaskStatus::Aborted(reason),
                                        })
                                        .ok();
                                    return;
                                }
                            }
                            TaskStatus::Aborted(reason)
                        }
                    }
                };

                match &status {
                    TaskStatus::Completed => counters.completed.fetch_add(1, Ordering::Relaxed),
                    TaskStatus::Aborted(_) => counters.aborted.fetch_add(1, Ordering::Relaxed),
                };
                if completions.send(Command::ServiceFinished { job, status }).is_err() {
                    debug!(worker_id, "engine gone, care worker exiting");
                    break;
                }
            }
            debug!(worker_id, "care worker exiting");
        })
}
