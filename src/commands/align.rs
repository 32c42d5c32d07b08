//! Align reads against the reference databases.
//!
//! Runs the alignment sweep over every (reference index, part) phase,
//! persisting per-read results into the key-value store as it goes. A run
//! interrupted and restarted over the same store picks up where it left off:
//! reads whose stored checkpoint matches a phase are skipped in that phase.

use anyhow::Result;
use clap::Parser;
use log::info;
use std::sync::Arc;

use refsieve_lib::logging::OperationTimer;
use refsieve_lib::pipeline::AlignFn;
use refsieve_lib::search::seed_search;

use crate::commands::command::Command;
use crate::commands::common::{build_config, build_pipeline, InputOptions, StrandOptions, ThreadOptions};

/// Align reads against reference databases.
#[derive(Debug, Parser)]
#[command(name = "align", about = "Align reads against reference databases")]
pub struct Align {
    #[clap(flatten)]
    pub input: InputOptions,

    #[clap(flatten)]
    pub threads: ThreadOptions,

    #[clap(flatten)]
    pub strands: StrandOptions,

    /// Seed length for the k-mer search
    #[arg(long = "seed-len", default_value_t = 18)]
    pub seed_len: usize,

    /// Minimum seed hits against one reference for a read to count as mapped
    #[arg(long = "min-seed-hits", default_value_t = 2)]
    pub min_seed_hits: usize,

    /// Count results but skip all store writes (debug)
    #[arg(long = "no-persist")]
    pub no_persist: bool,
}

impl Command for Align {
    fn execute(&self, command_line: &str) -> Result<()> {
        info!("Running: {command_line}");
        let mut config = build_config(&self.input, &self.threads, &self.strands);
        config.seed_len = self.seed_len;
        config.min_seed_hits = self.min_seed_hits;
        config.no_persist = self.no_persist;

        let timer = OperationTimer::new("Alignment");
        let pipeline = build_pipeline(&self.input, config)?;
        let callback: AlignFn = Arc::new(seed_search);
        pipeline.run_align(&callback)?;
        timer.log_completion(pipeline.stats().total_reads.load(std::sync::atomic::Ordering::Relaxed));
        Ok(())
    }
}
