// worker thread stuff

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::Job;

pub(crate) type WorkerId = usize;

/// Core workers live for the pool's lifetime; extra workers exist only
/// while there is a backlog and exit after the keepalive idle timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerKind {
    Core,
    Extra,
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub kind: WorkerKind,
    keepalive: Duration,
}

impl Worker {
    pub fn new(id: WorkerId, kind: WorkerKind, keepalive: Duration) -> Self {
        Self {
            id,
            kind,
            keepalive,
        }
    }

    // main loop
    pub fn run(
        &self,
        queue: Receiver<Job>,
        pending: Arc<AtomicUsize>,
        live_workers: Arc<AtomicUsize>,
    ) {
        loop {
            let job = match self.next_job(&queue) {
                Some(job) => job,
                None => break,
            };

            self.execute(job);
            pending.fetch_sub(1, Ordering::Release);
        }

        live_workers.fetch_sub(1, Ordering::Release);
        if self.kind == WorkerKind::Extra {
            tracing::debug!(worker = self.id, "extra worker retired after idle timeout");
        }
    }

    fn next_job(&self, queue: &Receiver<Job>) -> Option<Job> {
        match self.kind {
            // Core workers block until the pool is torn down.
            WorkerKind::Core => queue.recv().ok(),
            WorkerKind::Extra => match queue.recv_timeout(self.keepalive) {
                Ok(job) => Some(job),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
            },
        }
    }

    fn execute(&self, job: Job) {
        // A panicking job must not take the worker thread down with it.
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!(worker = self.id, "invocation panicked");
        }
    }
}
