//! Write a tab-separated report of aligned reads.
//!
//! Runs the report sweep: a single batching consumer per phase pulls reads in
//! pairing-aware batches, so with `--paired-in` or `--paired-out` mates stay
//! on adjacent lines. With `--paired-out` a batch is reported only when every
//! read in it is a hit; with `--paired-in` one hit is enough for the whole
//! batch.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use refsieve_lib::pipeline::ReportFn;

use crate::commands::command::Command;
use crate::commands::common::{build_config, build_pipeline, InputOptions, StrandOptions, ThreadOptions};

/// Write a TSV report of aligned reads.
#[derive(Debug, Parser)]
#[command(name = "report", about = "Write a TSV report of aligned reads")]
pub struct Report {
    #[clap(flatten)]
    pub input: InputOptions,

    #[clap(flatten)]
    pub threads: ThreadOptions,

    /// Output TSV path
    #[arg(long = "output", short = 'o')]
    pub output: PathBuf,

    /// Report the whole batch when any read in it is a hit
    #[arg(long = "paired-in", conflicts_with = "paired_out")]
    pub paired_in: bool,

    /// Report the batch only when every read in it is a hit
    #[arg(long = "paired-out")]
    pub paired_out: bool,
}

impl Command for Report {
    fn execute(&self, command_line: &str) -> Result<()> {
        info!("Running: {command_line}");
        let strands = StrandOptions { forward: false, reverse: false };
        let mut config = build_config(&self.input, &self.threads, &strands);
        config.paired_in = self.paired_in;
        config.paired_out = self.paired_out;

        let pipeline = build_pipeline(&self.input, config)?;
        let file = File::create(&self.output)
            .with_context(|| format!("creating report {}", self.output.display()))?;
        let out = Arc::new(Mutex::new(BufWriter::new(file)));
        let paired_out = self.paired_out;

        let callback: ReportFn = {
            let out = Arc::clone(&out);
            Arc::new(move |batch, refs, _config| {
                let keep = if paired_out {
                    batch.iter().all(|r| r.hit)
                } else {
                    batch.iter().any(|r| r.hit)
                };
                if !keep {
                    return;
                }
                let mut out = out.lock();
                for read in batch {
                    // Report the alignments of the resident phase only; each
                    // phase's sweep covers its own alignments.
                    for alignment in read
                        .alignments
                        .iter()
                        .filter(|a| a.index_num == refs.index_num && a.part == refs.part)
                    {
                        if let Err(e) = writeln!(
                            out,
                            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                            read.header,
                            alignment.ref_name,
                            alignment.ref_begin,
                            alignment.read_begin,
                            alignment.length,
                            alignment.score,
                            if alignment.forward { '+' } else { '-' }
                        ) {
                            error!("report write failed: {e}");
                            return;
                        }
                    }
                }
            })
        };

        pipeline.run_report(&callback)?;
        out.lock().flush().context("flushing report")?;
        info!("Report written to {}", self.output.display());
        Ok(())
    }
}
