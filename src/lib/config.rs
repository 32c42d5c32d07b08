//! Run configuration shared by all pipeline roles.

use crate::errors::{Result, SieveError};

/// Configuration for one pipeline run.
///
/// Built by the command layer and shared (read-only) by every role thread.
/// Thread counts size the queues' producer registrations, so they must match
/// the jobs the orchestrator actually submits.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of reader (producer) threads feeding the read queue.
    pub num_read_threads: usize,
    /// Number of processor threads consuming the read queue.
    pub num_proc_threads: usize,
    /// Number of writer threads consuming the write queue.
    pub num_write_threads: usize,
    /// Capacity bound of both queues; backpressure is via blocking push.
    pub queue_capacity: usize,
    /// Search the forward strand.
    pub forward: bool,
    /// Search the reverse-complemented strand.
    pub reverse: bool,
    /// Paired input reporting: aligned output keeps mates together.
    pub paired_in: bool,
    /// Paired output reporting: both mates written when either is a hit.
    pub paired_out: bool,
    /// Debug mode: count writes but skip the store `put`.
    pub no_persist: bool,
    /// Seed length used by the default k-mer search callback.
    pub seed_len: usize,
    /// Minimum seed hits against one reference for a read to count as mapped.
    pub min_seed_hits: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_read_threads: 1,
            num_proc_threads: 4,
            num_write_threads: 2,
            queue_capacity: 1000,
            forward: false,
            reverse: false,
            paired_in: false,
            paired_out: false,
            no_persist: false,
            seed_len: 18,
            min_seed_hits: 2,
        }
    }
}

impl RunConfig {
    /// Number of strand passes per read per phase.
    ///
    /// Exactly one pass when exactly one of forward/reverse is requested,
    /// otherwise both strands are searched (the default when neither flag is
    /// given, and the explicit behavior when both are).
    #[must_use]
    pub fn strand_passes(&self) -> usize {
        if self.forward ^ self.reverse { 1 } else { 2 }
    }

    /// Report batch size: 2 when paired reporting is enabled, else 1.
    #[must_use]
    pub fn report_batch(&self) -> usize {
        if self.paired_in || self.paired_out { 2 } else { 1 }
    }

    /// Validate thread counts and queue capacity.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::InvalidParameter`] for zero thread counts, a zero
    /// queue capacity, or a degenerate seed configuration.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(SieveError::InvalidParameter {
                parameter: "queue-capacity".to_string(),
                reason: "must be >= 1".to_string(),
            });
        }
        for (name, value) in [
            ("read-threads", self.num_read_threads),
            ("proc-threads", self.num_proc_threads),
            ("write-threads", self.num_write_threads),
        ] {
            if value == 0 {
                return Err(SieveError::InvalidParameter {
                    parameter: name.to_string(),
                    reason: "must be >= 1".to_string(),
                });
            }
        }
        if self.seed_len < 4 || self.seed_len > 64 {
            return Err(SieveError::InvalidParameter {
                parameter: "seed-len".to_string(),
                reason: "must be between 4 and 64".to_string(),
            });
        }
        if self.min_seed_hits == 0 {
            return Err(SieveError::InvalidParameter {
                parameter: "min-seed-hits".to_string(),
                reason: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}
