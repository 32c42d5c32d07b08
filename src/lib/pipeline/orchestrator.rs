//! Phase orchestration: the sequential loop over (reference index, part)
//! pairs driving the concurrent roles.
//!
//! Each phase is strictly load / run / teardown: one reference part is
//! resident at a time, the queues are reset with fresh producer counts, one
//! job per role is submitted to the pool, and the orchestrator blocks on the
//! pool barrier before releasing the part and moving on. All inter-phase
//! state lives in the durable store and the statistics aggregate.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::config::RunConfig;
use crate::errors::{Result, SieveError};
use crate::fastx::ReadSource;
use crate::logging::OperationTimer;
use crate::progress::ProgressTracker;
use crate::refs::ReferenceProvider;
use crate::stats::ReadStats;
use crate::store::KvStore;

use super::pool::WorkerPool;
use super::queue::ReadQueue;
use super::roles::{AlignFn, PostProcessor, Processor, Reader, ReportFn, ReportProcessor, Writer};

/// Factory producing one fresh [`ReadSource`] per reader role.
///
/// Called once per phase: every phase re-traverses the full input from the
/// beginning, so sources cannot be reused across phases.
pub type SourceFactory = Box<dyn Fn() -> Result<Vec<Box<dyn ReadSource>>> + Send + Sync>;

/// The pipeline: shared queues, the worker pool, and the phase loops.
pub struct Pipeline {
    config: Arc<RunConfig>,
    store: Arc<dyn KvStore>,
    provider: Arc<dyn ReferenceProvider>,
    sources: SourceFactory,
    stats: Arc<ReadStats>,
    read_queue: Arc<ReadQueue>,
    write_queue: Arc<ReadQueue>,
    pool: WorkerPool,
}

impl Pipeline {
    /// Build a pipeline and restore any prior statistics checkpoint.
    ///
    /// The pool is sized so every role of the busiest phase gets a thread;
    /// an undersized pool would deadlock a blocked producer behind a queued
    /// consumer job.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or an unreadable
    /// statistics checkpoint.
    pub fn new(
        config: RunConfig,
        store: Arc<dyn KvStore>,
        provider: Arc<dyn ReferenceProvider>,
        sources: SourceFactory,
    ) -> Result<Self> {
        config.validate()?;
        let stats = Arc::new(ReadStats::new(provider.num_indexes() as usize));
        if stats.restore(store.as_ref())? {
            log::info!(
                "Restored statistics checkpoint: {} reads from a prior run",
                stats.total_reads.load(Ordering::Relaxed)
            );
        }

        let num_threads =
            config.num_read_threads + config.num_proc_threads + config.num_write_threads;
        let pipeline = Self {
            read_queue: Arc::new(ReadQueue::new("read_queue", config.queue_capacity, 0)),
            write_queue: Arc::new(ReadQueue::new("write_queue", config.queue_capacity, 0)),
            pool: WorkerPool::new(num_threads),
            config: Arc::new(config),
            store,
            provider,
            sources,
            stats,
        };
        Ok(pipeline)
    }

    /// The shared statistics aggregate.
    #[must_use]
    pub fn stats(&self) -> &Arc<ReadStats> {
        &self.stats
    }

    /// Display names of all reference indexes, for the run summary.
    #[must_use]
    pub fn index_names(&self) -> Vec<String> {
        (0..self.provider.num_indexes())
            .map(|i| self.provider.index_name(i).to_string())
            .collect()
    }

    /// Every (index, part) phase in order.
    fn phases(&self) -> Vec<(u16, u16)> {
        let mut phases = Vec::new();
        for index_num in 0..self.provider.num_indexes() {
            for part in 0..self.provider.num_parts(index_num) {
                phases.push((index_num, part));
            }
        }
        phases
    }

    fn make_sources(&self) -> Result<Vec<Box<dyn ReadSource>>> {
        let sources = (self.sources)()?;
        if sources.is_empty() {
            return Err(SieveError::InvalidParameter {
                parameter: "reads".to_string(),
                reason: "no input sources".to_string(),
            });
        }
        if sources.len() > self.config.num_read_threads {
            return Err(SieveError::InvalidParameter {
                parameter: "read-threads".to_string(),
                reason: format!(
                    "{} sources but only {} reader threads",
                    sources.len(),
                    self.config.num_read_threads
                ),
            });
        }
        Ok(sources)
    }

    /// Submit one reader per source for the current phase.
    ///
    /// Ids are assigned round-robin (reader `i` takes `i`, `i + n`, ...), so
    /// a read's id depends only on its input position and the source count,
    /// never on scheduling.
    fn spawn_readers(
        &self,
        sources: Vec<Box<dyn ReadSource>>,
        count_stats: bool,
        progress: &Arc<ProgressTracker>,
    ) {
        let num_readers = sources.len() as u64;
        for (i, source) in sources.into_iter().enumerate() {
            let reader = Reader {
                id: format!("reader_{i}"),
                source,
                queue: Arc::clone(&self.read_queue),
                store: Arc::clone(&self.store),
                restore: true,
                count_stats,
                stats: Arc::clone(&self.stats),
                id_start: i as u64,
                id_step: num_readers,
                progress: Arc::clone(progress),
            };
            self.pool.execute(move || reader.run());
        }
    }

    fn spawn_writers(&self) {
        for i in 0..self.config.num_write_threads {
            let writer = Writer {
                id: format!("writer_{i}"),
                queue: Arc::clone(&self.write_queue),
                store: Arc::clone(&self.store),
                config: Arc::clone(&self.config),
            };
            self.pool.execute(move || writer.run());
        }
    }

    /// Run the alignment sweep: every phase, all roles, the given callback
    /// invoked once per strand pass per read.
    ///
    /// # Errors
    ///
    /// Returns an error when a reference part cannot be loaded or input
    /// sources cannot be opened. Per-read failures never surface here; they
    /// are logged and counted by the roles.
    pub fn run_align(&self, callback: &AlignFn) -> Result<()> {
        for (index_num, part) in self.phases() {
            let timer = OperationTimer::new(&format!(
                "Aligning reads against index {} ({}) part {}",
                index_num,
                self.provider.index_name(index_num),
                part
            ));
            let refs = Arc::new(self.provider.load(index_num, part)?);
            let sources = self.make_sources()?;

            self.read_queue.reset(sources.len() as u32);
            self.write_queue.reset(self.config.num_proc_threads as u32);

            // Reads are counted once, by the first phase of a first run; a
            // restored checkpoint already carries the totals.
            let first_phase = index_num == 0 && part == 0;
            let count_stats =
                first_phase && self.stats.total_reads.load(Ordering::Relaxed) == 0;
            let progress = Arc::new(ProgressTracker::for_phase(index_num, part));

            self.spawn_readers(sources, count_stats, &progress);
            for i in 0..self.config.num_proc_threads {
                let processor = Processor {
                    id: format!("proc_{i}"),
                    read_queue: Arc::clone(&self.read_queue),
                    write_queue: Arc::clone(&self.write_queue),
                    refs: Arc::clone(&refs),
                    stats: Arc::clone(&self.stats),
                    config: Arc::clone(&self.config),
                    callback: Arc::clone(callback),
                };
                self.pool.execute(move || processor.run());
            }
            self.spawn_writers();

            self.pool.wait_all();
            progress.log_final();
            timer.log_completion(progress.count());
            // Teardown: the part's memory is released before the next load.
            drop(refs);
        }
        Ok(())
    }

    /// Run the post-processing sweep and finalize the statistics checkpoint.
    ///
    /// De novo counters are recomputed from scratch, so they are cleared
    /// first even when a checkpoint was restored. The aggregate is persisted
    /// exactly once, after the last phase.
    ///
    /// # Errors
    ///
    /// Returns an error for load/input failures or a failed final persist.
    pub fn run_postprocess(&self, callback: &AlignFn) -> Result<()> {
        self.stats.reset_denovo();

        for (index_num, part) in self.phases() {
            let timer = OperationTimer::new(&format!(
                "Computing statistics for index {} part {}",
                index_num, part
            ));
            let refs = Arc::new(self.provider.load(index_num, part)?);
            let sources = self.make_sources()?;

            self.read_queue.reset(sources.len() as u32);
            self.write_queue.reset(self.config.num_proc_threads as u32);
            let progress = Arc::new(ProgressTracker::for_phase(index_num, part));

            self.spawn_readers(sources, false, &progress);
            for i in 0..self.config.num_proc_threads {
                let postprocessor = PostProcessor {
                    id: format!("postproc_{i}"),
                    read_queue: Arc::clone(&self.read_queue),
                    write_queue: Arc::clone(&self.write_queue),
                    refs: Arc::clone(&refs),
                    stats: Arc::clone(&self.stats),
                    config: Arc::clone(&self.config),
                    callback: Arc::clone(callback),
                };
                self.pool.execute(move || postprocessor.run());
            }
            self.spawn_writers();

            self.pool.wait_all();
            progress.log_final();
            timer.log_completion(progress.count());
        }

        if self.config.no_persist {
            self.stats.stats_done.store(true, Ordering::Relaxed);
        } else {
            self.stats.persist(self.store.as_ref())?;
            log::info!("Statistics checkpoint persisted");
        }
        Ok(())
    }

    /// Run the report sweep: a single batching consumer per phase, so paired
    /// reads stay adjacent.
    ///
    /// # Errors
    ///
    /// Returns an error for load/input failures.
    pub fn run_report(&self, callback: &ReportFn) -> Result<()> {
        for (index_num, part) in self.phases() {
            let timer = OperationTimer::new(&format!(
                "Reporting for index {} part {}",
                index_num, part
            ));
            let refs = Arc::new(self.provider.load(index_num, part)?);
            let sources = self.make_sources()?;

            self.read_queue.reset(sources.len() as u32);
            let progress = Arc::new(ProgressTracker::for_phase(index_num, part));

            self.spawn_readers(sources, false, &progress);
            let reporter = ReportProcessor {
                id: "report_0".to_string(),
                read_queue: Arc::clone(&self.read_queue),
                refs,
                config: Arc::clone(&self.config),
                callback: Arc::clone(callback),
            };
            self.pool.execute(move || reporter.run());

            self.pool.wait_all();
            progress.log_final();
            timer.log_completion(progress.count());
        }
        Ok(())
    }
}
