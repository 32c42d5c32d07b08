//! Compute and finalize run statistics from stored alignment results.
//!
//! Runs the post-processing sweep: reads are restored from the store, folded
//! into the statistics aggregate exactly once each, and the aggregate is
//! persisted as the final checkpoint. Run this after `align`.

use anyhow::Result;
use clap::Parser;
use log::info;
use std::sync::Arc;

use refsieve_lib::pipeline::AlignFn;
use refsieve_lib::search::compute_stats;

use crate::commands::command::Command;
use crate::commands::common::{build_config, build_pipeline, InputOptions, StrandOptions, ThreadOptions};

/// Compute run statistics from stored alignment results.
#[derive(Debug, Parser)]
#[command(name = "stats", about = "Compute run statistics from stored alignment results")]
pub struct Stats {
    #[clap(flatten)]
    pub input: InputOptions,

    #[clap(flatten)]
    pub threads: ThreadOptions,

    /// Count results but skip all store writes (debug)
    #[arg(long = "no-persist")]
    pub no_persist: bool,
}

impl Command for Stats {
    fn execute(&self, command_line: &str) -> Result<()> {
        info!("Running: {command_line}");
        let strands = StrandOptions { forward: false, reverse: false };
        let mut config = build_config(&self.input, &self.threads, &strands);
        config.no_persist = self.no_persist;

        let pipeline = build_pipeline(&self.input, config)?;
        let callback: AlignFn = Arc::new(compute_stats);
        pipeline.run_postprocess(&callback)?;
        pipeline.stats().log_summary(&pipeline.index_names());
        Ok(())
    }
}
