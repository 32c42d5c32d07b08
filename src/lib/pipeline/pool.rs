//! Fixed-size worker pool with a join-all barrier.
//!
//! The orchestrator submits one job per role per phase and blocks on
//! [`WorkerPool::wait_all`] until every job of that phase has returned. Jobs
//! are heterogeneous boxed closures; all cross-job communication goes
//! through the queues, never through thread-local state.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Jobs submitted since the last `wait_all` that have not yet returned.
struct Pending {
    count: Mutex<usize>,
    all_done: Condvar,
}

/// A fixed pool of OS threads executing heterogeneous jobs.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    pending: Arc<Pending>,
}

impl WorkerPool {
    /// Spawn `num_threads` workers.
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        let (sender, receiver): (Sender<Job>, Receiver<Job>) = unbounded();
        let mut workers = Vec::with_capacity(num_threads);
        for i in 0..num_threads {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }
        Self {
            sender: Some(sender),
            workers,
            pending: Arc::new(Pending { count: Mutex::new(0), all_done: Condvar::new() }),
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a job to run on an available worker.
    ///
    /// A panicking job is caught and logged so the pool stays usable and
    /// `wait_all` still unblocks; the panic does not propagate.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.pending.count.lock() += 1;
        let pending = Arc::clone(&self.pending);
        let wrapped = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(job));
            if result.is_err() {
                log::error!("worker job panicked");
            }
            let mut count = pending.count.lock();
            *count -= 1;
            if *count == 0 {
                pending.all_done.notify_all();
            }
        });
        self.sender
            .as_ref()
            .expect("worker pool already shut down")
            .send(wrapped)
            .expect("worker pool channel closed");
    }

    /// Block until every job submitted since the last `wait_all` has
    /// returned.
    pub fn wait_all(&self) {
        let mut count = self.pending.count.lock();
        while *count > 0 {
            self.pending.all_done.wait(&mut count);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel lets each worker drain and exit.
        self.sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
