//! Thread roles submitted to the worker pool for each phase.
//!
//! Every role is a callable object that runs to completion on a pool
//! thread. Producers end by decrementing their queue's pusher count;
//! consumers end when the termination predicate holds (sentinel popped with
//! zero pushers). No errors cross a queue boundary: a read that cannot be
//! processed is skipped and counted, and a thread-fatal failure still
//! performs its pusher decrement so downstream roles are not starved.

use std::sync::Arc;

use crate::config::RunConfig;
use crate::fastx::ReadSource;
use crate::progress::ProgressTracker;
use crate::read::ReadUnit;
use crate::refs::References;
use crate::stats::ReadStats;
use crate::store::KvStore;

use super::queue::ReadQueue;

/// The external alignment callback invoked once per strand pass.
///
/// May set hit/denovo state and append alignments on the read; may bump
/// statistics counters. Must not assume exclusive access to the statistics
/// beyond its own atomic increments.
pub type AlignFn = Arc<dyn Fn(&mut ReadUnit, &References, &ReadStats, &RunConfig) + Send + Sync>;

/// The batched report callback, invoked only on complete valid batches.
pub type ReportFn = Arc<dyn Fn(&[ReadUnit], &References, &RunConfig) + Send + Sync>;

/// Producer role: pulls raw reads from an input source and pushes read units
/// into the read queue.
pub struct Reader {
    /// Role id for log lines.
    pub id: String,
    /// The input source owned by this reader.
    pub source: Box<dyn ReadSource>,
    /// Destination queue.
    pub queue: Arc<ReadQueue>,
    /// Store consulted for per-read checkpoint restore.
    pub store: Arc<dyn KvStore>,
    /// Whether to attempt checkpoint restore for each read.
    pub restore: bool,
    /// Whether to record read counts/lengths (first phase only, so totals
    /// are not multiplied by the number of phases).
    pub count_stats: bool,
    /// Shared statistics aggregate.
    pub stats: Arc<ReadStats>,
    /// First id assigned by this reader.
    pub id_start: u64,
    /// Id stride (the number of readers), keeping ids disjoint and stable
    /// across runs.
    pub id_step: u64,
    /// Shared per-phase progress tracker.
    pub progress: Arc<ProgressTracker>,
}

impl Reader {
    /// Run the producer loop to completion.
    pub fn run(mut self) {
        log::debug!("{} started", self.id);
        let mut pushed: u64 = 0;
        let mut invalid: u64 = 0;
        let mut next_id = self.id_start;

        loop {
            let raw = match self.source.next_read() {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(e) => {
                    // Fatal for this reader, but the pusher decrement below
                    // still runs so consumers can terminate.
                    log::error!("{}: input source failed: {e}", self.id);
                    break;
                }
            };

            let mut read = ReadUnit::new(next_id, raw.header, raw.sequence, raw.quality);
            next_id += self.id_step;

            if self.count_stats {
                if read.is_valid {
                    self.stats.record_read(read.sequence.len());
                } else {
                    self.stats.record_invalid();
                }
            }
            if !read.is_valid {
                // Malformed reads are counted and kept out of the queues.
                invalid += 1;
                continue;
            }

            if self.restore {
                if let Err(e) = read.restore(self.store.as_ref()) {
                    log::warn!("{}: restore failed for read {}: {e}", self.id, read.id);
                }
            }

            self.queue.push(read);
            pushed += 1;
            self.progress.log_if_needed(1);
        }

        self.queue.decrement_pushers();
        log::debug!("{} done. Pushed {pushed} reads, dropped {invalid} invalid", self.id);
    }
}

/// Shared termination handling for queue consumers.
///
/// Returns `None` when the role should terminate, `Some(read)` for a read to
/// handle. A sentinel popped while producers remain is skipped by looping.
fn next_or_done(queue: &ReadQueue) -> Option<ReadUnit> {
    loop {
        let read = queue.pop();
        if read.is_empty {
            if queue.pushers() == 0 {
                return None;
            }
            // Sentinel with live producers: no data right now, keep polling.
            continue;
        }
        return Some(read);
    }
}

/// Consumer of the read queue and producer into the write queue; invokes the
/// alignment callback per strand pass.
pub struct Processor {
    pub id: String,
    pub read_queue: Arc<ReadQueue>,
    pub write_queue: Arc<ReadQueue>,
    pub refs: Arc<References>,
    pub stats: Arc<ReadStats>,
    pub config: Arc<RunConfig>,
    pub callback: AlignFn,
}

impl Processor {
    /// Run the processor loop to completion.
    pub fn run(self) {
        log::debug!("{} started", self.id);
        let mut processed: u64 = 0;
        let mut skipped_restored: u64 = 0;

        while let Some(mut read) = next_or_done(&self.read_queue) {
            // Resumability: a restored read whose checkpoint matches the
            // current phase was fully processed by a prior run.
            let already_processed = read.is_restored
                && read.last_index == self.refs.index_num
                && read.last_part == self.refs.part;
            if already_processed {
                skipped_restored += 1;
                self.stats.record_skipped_restored();
                continue;
            }
            if !read.is_valid {
                continue;
            }

            // Re-processing an earlier phase after restart: drop that
            // phase's restored alignments so the result has no duplicates.
            if read.is_restored {
                read.begin_phase(self.refs.index_num, self.refs.part);
            }

            let single_strand = self.config.forward ^ self.config.reverse;
            let strand_passes = self.config.strand_passes();
            for pass in 0..strand_passes {
                if (single_strand && self.config.reverse) || pass == 1 {
                    if !read.reversed {
                        read.reverse_complement();
                    }
                }
                read.begin_strand_pass();
                (self.callback)(&mut read, &self.refs, &self.stats, &self.config);
            }
            read.last_index = self.refs.index_num;
            read.last_part = self.refs.part;

            if read.is_valid && !read.is_empty {
                self.write_queue.push(read);
            }
            processed += 1;
        }

        // Signal this processor is done producing; wakes any writer blocked
        // in pop so it can re-check termination.
        self.write_queue.decrement_pushers();
        log::debug!(
            "{} done. Processed {processed} reads, skipped already processed: {skipped_restored}",
            self.id
        );
    }
}

/// Processor variant for the statistics sweep.
///
/// Invokes the callback once per read (no strand passes) and drops
/// `hit_denovo` reads from the write queue; they are accounted for in the
/// statistics but not persisted as alignment output.
pub struct PostProcessor {
    pub id: String,
    pub read_queue: Arc<ReadQueue>,
    pub write_queue: Arc<ReadQueue>,
    pub refs: Arc<References>,
    pub stats: Arc<ReadStats>,
    pub config: Arc<RunConfig>,
    pub callback: AlignFn,
}

impl PostProcessor {
    /// Run the post-processor loop to completion.
    pub fn run(self) {
        log::debug!("{} started", self.id);
        let mut processed: u64 = 0;

        while let Some(mut read) = next_or_done(&self.read_queue) {
            if !read.is_valid {
                continue;
            }
            (self.callback)(&mut read, &self.refs, &self.stats, &self.config);
            processed += 1;

            if !read.hit_denovo {
                self.write_queue.push(read);
            }
        }

        self.write_queue.decrement_pushers();
        log::debug!("{} done. Processed {processed} reads", self.id);
    }
}

/// Batched, pairing-aware consumer for report generation.
///
/// Pops reads in groups of `cap` (2 when paired reporting is enabled) and
/// passes only complete, valid batches to the callback; an incomplete batch
/// would corrupt pairing and is discarded instead.
pub struct ReportProcessor {
    pub id: String,
    pub read_queue: Arc<ReadQueue>,
    pub refs: Arc<References>,
    pub config: Arc<RunConfig>,
    pub callback: ReportFn,
}

impl ReportProcessor {
    /// Run the report loop to completion.
    pub fn run(self) {
        log::debug!("{} started", self.id);
        let cap = self.config.report_batch();
        let mut reported: u64 = 0;
        let mut batch: Vec<ReadUnit> = Vec::with_capacity(cap);
        let mut done = false;

        while !done {
            batch.clear();
            for _ in 0..cap {
                let read = self.read_queue.pop();
                if read.is_empty {
                    if self.read_queue.pushers() == 0 {
                        done = true;
                    }
                    // Sentinel or no data: the batch below is incomplete
                    // either way.
                    break;
                }
                batch.push(read);
            }

            // Only complete, all-valid batches reach the callback.
            if batch.len() < cap || batch.iter().any(|r| !r.is_valid) {
                continue;
            }
            (self.callback)(&batch, &self.refs, &self.config);
            reported += batch.len() as u64;
        }

        log::debug!("{} done. Reported {reported} reads", self.id);
    }
}

/// Consumer of the write queue; persists each processed read's serialized
/// result into the durable store.
pub struct Writer {
    pub id: String,
    pub queue: Arc<ReadQueue>,
    pub store: Arc<dyn KvStore>,
    pub config: Arc<RunConfig>,
}

impl Writer {
    /// Run the writer loop to completion.
    pub fn run(self) {
        log::debug!("{} started", self.id);
        let mut written: u64 = 0;
        let mut popped: u64 = 0;
        let mut dropped: u64 = 0;
        let mut failed = false;

        while let Some(read) = next_or_done(&self.queue) {
            popped += 1;
            let Some(result) = read.result() else { continue };
            if self.config.no_persist {
                written += 1;
                continue;
            }
            if failed {
                dropped += 1;
                continue;
            }
            let put = serde_json::to_vec(&result)
                .map_err(crate::errors::SieveError::from)
                .and_then(|bytes| self.store.put(&ReadUnit::key(read.id), &bytes));
            match put {
                Ok(()) => written += 1,
                Err(e) => {
                    // Fatal for persistence, but keep draining the queue so
                    // upstream producers are never blocked on a full queue.
                    log::error!("{}: store write failed: {e}", self.id);
                    failed = true;
                    dropped += 1;
                }
            }
        }

        log::debug!(
            "{} done. Popped {popped} reads, persisted {written}, dropped unpersisted {dropped}",
            self.id
        );
    }
}
