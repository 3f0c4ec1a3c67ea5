//! Fixed-size worker pool
//!
//! Jobs travel over an unbounded crossbeam channel to a fixed set of OS
//! threads. Submitting never blocks. Shutting down closes the channel:
//! queued jobs still drain, new submissions are rejected, and the caller
//! chooses whether to join the workers.

use crate::error::{HashCalcError, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads fed from one queue
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
    active: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawn `threads` workers
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(HashCalcError::config("worker pool needs at least one thread"));
        }

        let (sender, receiver) = unbounded::<Job>();
        let active = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::with_capacity(threads);

        for worker_id in 0..threads {
            let receiver = receiver.clone();
            let active = Arc::clone(&active);
            let handle = thread::Builder::new()
                .name(format!("hashcalc-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, receiver, active))
                .map_err(|e| {
                    HashCalcError::ThreadPoolError(format!("failed to spawn worker: {}", e))
                })?;
            workers.push(handle);
        }

        tracing::debug!("Started worker pool with {} threads", threads);

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            threads,
            active,
        })
    }

    /// Queue a job
    ///
    /// Fails once the pool has been shut down.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            return Err(HashCalcError::ThreadPoolError(
                "pool is shut down".to_string(),
            ));
        };
        sender
            .send(Box::new(job))
            .map_err(|_| HashCalcError::ThreadPoolError("all workers have exited".to_string()))
    }

    /// Stop accepting jobs; with `wait`, block until every queued job ran
    pub fn shutdown(&self, wait: bool) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            tracing::debug!("Shutting down worker pool (wait = {})", wait);
        }
        drop(sender);

        if wait {
            let workers: Vec<_> = self
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect();
            for worker in workers {
                let _ = worker.join();
            }
        }
    }

    /// Whether the pool still accepts jobs
    pub fn is_shutdown(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Number of worker threads
    pub fn thread_count(&self) -> usize {
        self.threads
    }

    /// Jobs executing right now
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown(false);
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("active", &self.active_count())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn run_worker(worker_id: usize, receiver: Receiver<Job>, active: Arc<AtomicUsize>) {
    while let Ok(job) = receiver.recv() {
        active.fetch_add(1, Ordering::SeqCst);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            tracing::warn!(
                "Worker {} recovered from a panicking job: {}",
                worker_id,
                panic_message(payload.as_ref())
            );
        }
        active.fetch_sub(1, Ordering::SeqCst);
    }

    tracing::debug!("Worker {} shutting down", worker_id);
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
