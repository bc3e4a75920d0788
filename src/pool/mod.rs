//! Bounded worker pool with immediate overflow rejection.
//!
//! The queue itself is an unbounded channel; capacity is enforced by an
//! atomic admission counter covering every task that has been accepted
//! but not yet finished executing. Submission therefore never blocks: it
//! either succeeds immediately or fails immediately with
//! [`Error::Saturated`].

mod worker;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use worker::{Worker, WorkerKind};

/// A unit of work as the pool sees it: the fully wrapped invocation.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    receiver: Receiver<Job>,
    pending: Arc<AtomicUsize>,
    live_workers: Arc<AtomicUsize>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    config: PoolConfig,
    next_worker_id: AtomicUsize,
}

impl WorkerPool {
    /// Build the pool and spawn its core workers.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = crossbeam_channel::unbounded();

        let pool = Self {
            sender: Some(sender),
            receiver,
            pending: Arc::new(AtomicUsize::new(0)),
            live_workers: Arc::new(AtomicUsize::new(0)),
            handles: Mutex::new(Vec::with_capacity(config.core_workers)),
            config,
            next_worker_id: AtomicUsize::new(0),
        };

        for _ in 0..pool.config.core_workers {
            pool.live_workers.fetch_add(1, Ordering::Release);
            pool.spawn_worker(WorkerKind::Core)?;
        }

        tracing::debug!(
            core = pool.config.core_workers,
            max = pool.config.max_workers,
            queue = pool.config.queue_size,
            "worker pool started"
        );

        Ok(pool)
    }

    /// Submit a job, rejecting immediately when the pool is saturated.
    pub(crate) fn submit(&self, job: Job) -> Result<()> {
        let admitted = self.pending.fetch_add(1, Ordering::Acquire);
        if admitted >= self.config.queue_size {
            self.pending.fetch_sub(1, Ordering::Release);
            return Err(Error::Saturated {
                capacity: self.config.queue_size,
            });
        }

        let sender = self.sender.as_ref().ok_or(Error::Shutdown)?;
        if sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::Release);
            return Err(Error::Shutdown);
        }

        self.maybe_grow();
        Ok(())
    }

    /// Submit a plain closure, rejecting immediately when saturated.
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(f))
    }

    /// Tasks admitted but not yet finished.
    pub fn pending_tasks(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Workers currently alive, core and extra.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    // Spawn an extra worker when a backlog exceeds the live worker count
    // and headroom below `max_workers` remains. The live slot is reserved
    // with a compare-and-swap so racing submitters cannot overshoot the
    // cap.
    fn maybe_grow(&self) {
        let backlog = self.pending.load(Ordering::Acquire);
        if backlog <= self.live_workers() {
            return;
        }

        let max = self.config.max_workers;
        let reserved = self
            .live_workers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                if live < max {
                    Some(live + 1)
                } else {
                    None
                }
            });

        if reserved.is_ok() {
            if let Err(err) = self.spawn_worker(WorkerKind::Extra) {
                tracing::warn!(error = %err, "failed to grow worker pool");
            }
        }
    }

    // Expects a live-worker slot to already be reserved; releases it if
    // the thread cannot be spawned.
    fn spawn_worker(&self, kind: WorkerKind) -> Result<()> {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let worker = Worker::new(id, kind, self.config.keepalive);
        let queue = self.receiver.clone();
        let pending = self.pending.clone();
        let live_workers = self.live_workers.clone();
        let name = format!("{}-{}", self.config.thread_name_prefix, id);

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || worker.run(queue, pending, live_workers))
            .map_err(|e| {
                self.live_workers.fetch_sub(1, Ordering::Release);
                Error::executor(format!("spawn failed: {}", e))
            })?;

        self.handles.lock().push(handle);
        Ok(())
    }

    /// Stop accepting work and join the workers. The global dispatch pool
    /// is never shut down; this exists for owned pools and tests.
    pub fn shutdown(&mut self) {
        self.sender.take();

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("pending", &self.pending_tasks())
            .field("live_workers", &self.live_workers())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tiny_config() -> PoolConfig {
        PoolConfig::builder()
            .queue_size(1)
            .core_workers(1)
            .max_workers(1)
            .keepalive(Duration::from_secs(1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_rejects_beyond_capacity() {
        let pool = WorkerPool::new(tiny_config()).unwrap();

        let accepted = pool.submit(Box::new(|| {
            std::thread::sleep(Duration::from_millis(200));
        }));
        assert!(accepted.is_ok());

        let rejected = pool.submit(Box::new(|| {}));
        match rejected {
            Err(Error::Saturated { capacity }) => assert_eq!(capacity, 1),
            other => panic!("expected saturation, got {:?}", other),
        }
    }

    #[test]
    fn test_capacity_frees_after_completion() {
        let pool = WorkerPool::new(tiny_config()).unwrap();

        pool.submit(Box::new(|| {})).unwrap();
        while pool.pending_tasks() > 0 {
            std::thread::yield_now();
        }

        assert!(pool.submit(Box::new(|| {})).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PoolConfig {
            core_workers: 4,
            max_workers: 2,
            ..PoolConfig::default()
        };
        assert!(WorkerPool::new(config).is_err());
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::new(tiny_config()).unwrap();

        pool.submit(Box::new(|| panic!("boom"))).unwrap();
        while pool.pending_tasks() > 0 {
            std::thread::yield_now();
        }

        pool.submit(Box::new(|| {})).unwrap();
        while pool.pending_tasks() > 0 {
            std::thread::yield_now();
        }
        assert_eq!(pool.live_workers(), 1);
    }
}
