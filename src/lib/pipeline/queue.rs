//! Bounded read queue with producer-count-based termination.
//!
//! This is the one reusable synchronization primitive every role is built
//! on. The termination predicate consumers must apply is: a popped sentinel
//! with a pusher count of zero means no data will ever arrive again. A
//! consumer that stops on "empty" alone can shut down while a slow producer
//! is still working; one that never checks the pusher count can block
//! forever.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::read::ReadUnit;

/// Thread-safe bounded FIFO of read units shared by producer and consumer
/// roles.
///
/// Backpressure is via blocking: `push` never rejects, it waits for space.
/// The live producer count is tracked so `pop` can distinguish "empty for
/// now" from "empty forever".
pub struct ReadQueue {
    name: String,
    capacity: usize,
    inner: Mutex<VecDeque<ReadUnit>>,
    /// Producers that may still push. Guarded updates go through
    /// `decrement_pushers` / `reset` so waiting consumers observe them.
    pushers: AtomicU32,
    /// Producers wait here for space.
    space: Condvar,
    /// Consumers wait here for data or a pusher-count change.
    data: Condvar,
}

impl ReadQueue {
    /// Create a queue with the given capacity and initial producer count.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize, pushers: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            pushers: AtomicU32::new(pushers),
            space: Condvar::new(),
            data: Condvar::new(),
        }
    }

    /// Queue name, for log lines.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capacity bound.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of queued reads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when no reads are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Live producer count.
    #[must_use]
    pub fn pushers(&self) -> u32 {
        self.pushers.load(Ordering::Acquire)
    }

    /// Insert at the tail, blocking while the queue is at capacity.
    ///
    /// Never rejects; backpressure is the blocking itself.
    pub fn push(&self, read: ReadUnit) {
        let mut queue = self.inner.lock();
        while queue.len() >= self.capacity {
            self.space.wait(&mut queue);
        }
        queue.push_back(read);
        drop(queue);
        self.data.notify_one();
    }

    /// Remove and return the head.
    ///
    /// Blocks while the queue is empty and producers remain. When the queue
    /// is empty and the pusher count is zero, returns a sentinel immediately
    /// instead of blocking forever. Data present is returned regardless of
    /// the pusher count.
    pub fn pop(&self) -> ReadUnit {
        let mut queue = self.inner.lock();
        loop {
            if let Some(read) = queue.pop_front() {
                drop(queue);
                self.space.notify_one();
                return read;
            }
            if self.pushers.load(Ordering::Acquire) == 0 {
                return ReadUnit::sentinel();
            }
            self.data.wait(&mut queue);
        }
    }

    /// Reduce the live producer count by one; called exactly once per
    /// producer, after its last push.
    ///
    /// Wakes every blocked consumer so it can re-evaluate the termination
    /// predicate even if no further data arrives. The count is updated under
    /// the queue lock so a consumer between its pusher check and its wait
    /// cannot miss the wakeup.
    pub fn decrement_pushers(&self) {
        let guard = self.inner.lock();
        let previous = self.pushers.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "{}: pusher count underflow", self.name);
        drop(guard);
        self.data.notify_all();
    }

    /// Wake all blocked consumers to re-check the termination condition.
    pub fn notify(&self) {
        self.data.notify_all();
    }

    /// Clear remaining contents and reinitialize the pusher count.
    ///
    /// Used between phases to reuse the queue. Must not race with live
    /// producers or consumers of the previous phase; the orchestrator calls
    /// it only after `wait_all` has confirmed every role exited.
    pub fn reset(&self, pushers: u32) {
        let mut queue = self.inner.lock();
        queue.clear();
        self.pushers.store(pushers, Ordering::Release);
        drop(queue);
        self.space.notify_all();
    }
}
