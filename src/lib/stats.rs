//! Process-wide read statistics, aggregated concurrently across all phases.
//!
//! All counters are atomics so processor-role threads can update them without
//! holding a lock during alignment work. The aggregate is restored from the
//! durable store at startup when a prior run left a checkpoint, and written
//! back exactly once at finalize.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::errors::Result;
use crate::logging::{format_count, format_percent};
use crate::store::KvStore;

/// Fixed store key for the statistics checkpoint blob.
pub const STATS_KEY: &str = "readstats";

/// Concurrent aggregate of per-run read statistics.
#[derive(Debug)]
pub struct ReadStats {
    /// Total reads seen by the readers (counted once, on the first phase).
    pub total_reads: AtomicU64,
    /// Malformed reads excluded from the queues.
    pub invalid_reads: AtomicU64,
    /// Reads skipped because their checkpoint matched the current phase.
    pub skipped_restored: AtomicU64,
    /// Reads that matched a reference above threshold.
    pub total_mapped: AtomicU64,
    /// Reads flagged for de novo clustering.
    pub total_denovo: AtomicU64,
    /// Minimum read length seen.
    pub min_read_len: AtomicU32,
    /// Maximum read length seen.
    pub max_read_len: AtomicU32,
    /// Sum of read lengths, for the mean.
    pub total_read_len: AtomicU64,
    /// Reads matched per reference index (database).
    pub matched_per_index: Vec<AtomicU64>,
    /// De novo OTU map: reference sequence name -> member read headers.
    pub otu_map: Mutex<BTreeMap<String, Vec<String>>>,
    /// Set once the checkpoint has been finalized and persisted.
    pub stats_done: AtomicBool,
}

/// Plain snapshot of [`ReadStats`] for (de)serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCheckpoint {
    pub total_reads: u64,
    pub invalid_reads: u64,
    pub total_mapped: u64,
    pub total_denovo: u64,
    pub min_read_len: u32,
    pub max_read_len: u32,
    pub total_read_len: u64,
    pub matched_per_index: Vec<u64>,
    pub otu_map: BTreeMap<String, Vec<String>>,
    pub stats_done: bool,
}

impl ReadStats {
    /// Create zeroed statistics sized for `num_indexes` reference databases.
    #[must_use]
    pub fn new(num_indexes: usize) -> Self {
        Self {
            total_reads: AtomicU64::new(0),
            invalid_reads: AtomicU64::new(0),
            skipped_restored: AtomicU64::new(0),
            total_mapped: AtomicU64::new(0),
            total_denovo: AtomicU64::new(0),
            min_read_len: AtomicU32::new(u32::MAX),
            max_read_len: AtomicU32::new(0),
            total_read_len: AtomicU64::new(0),
            matched_per_index: (0..num_indexes).map(|_| AtomicU64::new(0)).collect(),
            otu_map: Mutex::new(BTreeMap::new()),
            stats_done: AtomicBool::new(false),
        }
    }

    /// Record one read seen by a reader (first phase only).
    pub fn record_read(&self, len: usize) {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.total_reads.fetch_add(1, Ordering::Relaxed);
        self.total_read_len.fetch_add(u64::from(len), Ordering::Relaxed);
        self.min_read_len.fetch_min(len, Ordering::Relaxed);
        self.max_read_len.fetch_max(len, Ordering::Relaxed);
    }

    /// Record one malformed read.
    pub fn record_invalid(&self) {
        self.invalid_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one read skipped by the resumability check.
    pub fn record_skipped_restored(&self) {
        self.skipped_restored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one mapped read for the given reference index.
    pub fn record_match(&self, index_num: usize) {
        self.total_mapped.fetch_add(1, Ordering::Relaxed);
        if let Some(counter) = self.matched_per_index.get(index_num) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one de novo clustering candidate, keyed by its best reference.
    pub fn record_denovo(&self, ref_name: &str, read_header: &str) {
        self.total_denovo.fetch_add(1, Ordering::Relaxed);
        self.otu_map.lock().entry(ref_name.to_string()).or_default().push(read_header.to_string());
    }

    /// Reset the de novo counters before a post-processing sweep.
    ///
    /// A restored checkpoint already carries de novo totals; the sweep
    /// recomputes them from stored reads, so carrying the old value over
    /// would double count.
    pub fn reset_denovo(&self) {
        self.total_denovo.store(0, Ordering::Relaxed);
        self.otu_map.lock().clear();
    }

    /// Mean read length, or 0.0 when no reads were seen.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_read_len(&self) -> f64 {
        let total = self.total_reads.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.total_read_len.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Take a plain snapshot of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsCheckpoint {
        let min = self.min_read_len.load(Ordering::Relaxed);
        StatsCheckpoint {
            total_reads: self.total_reads.load(Ordering::Relaxed),
            invalid_reads: self.invalid_reads.load(Ordering::Relaxed),
            total_mapped: self.total_mapped.load(Ordering::Relaxed),
            total_denovo: self.total_denovo.load(Ordering::Relaxed),
            min_read_len: if min == u32::MAX { 0 } else { min },
            max_read_len: self.max_read_len.load(Ordering::Relaxed),
            total_read_len: self.total_read_len.load(Ordering::Relaxed),
            matched_per_index: self
                .matched_per_index
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            otu_map: self.otu_map.lock().clone(),
            stats_done: self.stats_done.load(Ordering::Relaxed),
        }
    }

    /// Overwrite the counters from a snapshot.
    pub fn apply(&self, checkpoint: &StatsCheckpoint) {
        self.total_reads.store(checkpoint.total_reads, Ordering::Relaxed);
        self.invalid_reads.store(checkpoint.invalid_reads, Ordering::Relaxed);
        self.total_mapped.store(checkpoint.total_mapped, Ordering::Relaxed);
        self.total_denovo.store(checkpoint.total_denovo, Ordering::Relaxed);
        let min = if checkpoint.min_read_len == 0 && checkpoint.total_reads == 0 {
            u32::MAX
        } else {
            checkpoint.min_read_len
        };
        self.min_read_len.store(min, Ordering::Relaxed);
        self.max_read_len.store(checkpoint.max_read_len, Ordering::Relaxed);
        self.total_read_len.store(checkpoint.total_read_len, Ordering::Relaxed);
        for (counter, value) in self.matched_per_index.iter().zip(&checkpoint.matched_per_index) {
            counter.store(*value, Ordering::Relaxed);
        }
        *self.otu_map.lock() = checkpoint.otu_map.clone();
        self.stats_done.store(checkpoint.stats_done, Ordering::Relaxed);
    }

    /// Restore a prior run's checkpoint from the store.
    ///
    /// Returns whether a checkpoint existed. Absence is not an error: the run
    /// is simply treated as a first run.
    pub fn restore(&self, store: &dyn KvStore) -> Result<bool> {
        let Some(bytes) = store.get(STATS_KEY)? else {
            return Ok(false);
        };
        let checkpoint: StatsCheckpoint = serde_json::from_slice(&bytes)?;
        self.apply(&checkpoint);
        Ok(true)
    }

    /// Persist the aggregate as the authoritative checkpoint, marking it done.
    pub fn persist(&self, store: &dyn KvStore) -> Result<()> {
        self.stats_done.store(true, Ordering::Relaxed);
        let bytes = serde_json::to_vec(&self.snapshot())?;
        store.put(STATS_KEY, &bytes)
    }

    /// Log the human-readable run summary.
    ///
    /// `index_names` labels the per-database lines; extra counters are
    /// skipped when the name list is shorter.
    #[allow(clippy::cast_precision_loss)]
    pub fn log_summary(&self, index_names: &[String]) {
        let total = self.total_reads.load(Ordering::Relaxed);
        let mapped = self.total_mapped.load(Ordering::Relaxed);
        let denovo = self.total_denovo.load(Ordering::Relaxed);

        log::info!("Results:");
        log::info!("  Total reads: {}", format_count(total));
        if total == 0 {
            return;
        }
        log::info!(
            "  Reads passing threshold: {} ({})",
            format_count(mapped),
            format_percent(mapped as f64 / total as f64, 2)
        );
        log::info!(
            "  Reads failing threshold: {} ({})",
            format_count(total - mapped),
            format_percent((total - mapped) as f64 / total as f64, 2)
        );
        if denovo > 0 {
            log::info!("  Reads for de novo clustering: {}", format_count(denovo));
            log::info!("  Total OTUs: {}", format_count(self.otu_map.lock().len() as u64));
        }
        let min = self.min_read_len.load(Ordering::Relaxed);
        log::info!("  Minimum read length: {}", if min == u32::MAX { 0 } else { min });
        log::info!("  Maximum read length: {}", self.max_read_len.load(Ordering::Relaxed));
        log::info!("  Mean read length: {:.1}", self.mean_read_len());
        log::info!("By database:");
        for (name, counter) in index_names.iter().zip(&self.matched_per_index) {
            let matched = counter.load(Ordering::Relaxed);
            log::info!(
                "  {}: {}",
                name,
                format_percent(matched as f64 / total as f64, 2)
            );
        }
    }
}
