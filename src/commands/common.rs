//! Shared CLI option groups and pipeline wiring used by multiple commands.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use refsieve_lib::config::RunConfig;
use refsieve_lib::fastx::{FastxReader, ReadSource};
use refsieve_lib::pipeline::{Pipeline, SourceFactory};
use refsieve_lib::refs::FastaReferenceProvider;
use refsieve_lib::store::FileStore;

/// Input files and the durable store location.
#[derive(Debug, Clone, Parser)]
pub struct InputOptions {
    /// Read files (FASTA or FASTQ, optionally gzipped); one reader thread per file
    #[arg(long = "reads", required = true, num_args = 1..)]
    pub reads: Vec<PathBuf>,

    /// Reference FASTA files (optionally gzipped); each file is one reference index
    #[arg(long = "refs", required = true, num_args = 1..)]
    pub refs: Vec<PathBuf>,

    /// Key-value store file for per-read results and the statistics checkpoint
    #[arg(long = "store", default_value = "refsieve.kvdb")]
    pub store: PathBuf,

    /// Maximum bytes of reference sequence resident at once (per part)
    #[arg(long = "max-part-bytes", default_value_t = 256 * 1024 * 1024)]
    pub max_part_bytes: u64,
}

/// Thread and queue sizing.
#[derive(Debug, Clone, Parser)]
pub struct ThreadOptions {
    /// Number of processor threads
    #[arg(long = "proc-threads", default_value_t = 4)]
    pub proc_threads: usize,

    /// Number of writer threads
    #[arg(long = "write-threads", default_value_t = 2)]
    pub write_threads: usize,

    /// Capacity of the read and write queues
    #[arg(long = "queue-capacity", default_value_t = 1000)]
    pub queue_capacity: usize,
}

/// Strand selection. Neither flag searches both strands, as does giving both.
#[derive(Debug, Clone, Parser)]
pub struct StrandOptions {
    /// Search the forward strand
    #[arg(long = "forward")]
    pub forward: bool,

    /// Search the reverse-complemented strand
    #[arg(long = "reverse")]
    pub reverse: bool,
}

/// Fail early with a clear message when an input file is missing.
pub fn validate_file_exists(path: &Path, label: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{label} file does not exist: {}", path.display());
    }
    Ok(())
}

/// Fill a [`RunConfig`] from the shared option groups.
#[must_use]
pub fn build_config(
    input: &InputOptions,
    threads: &ThreadOptions,
    strands: &StrandOptions,
) -> RunConfig {
    RunConfig {
        num_read_threads: input.reads.len(),
        num_proc_threads: threads.proc_threads,
        num_write_threads: threads.write_threads,
        queue_capacity: threads.queue_capacity,
        forward: strands.forward,
        reverse: strands.reverse,
        ..RunConfig::default()
    }
}

/// Open the store and references and assemble a [`Pipeline`].
pub fn build_pipeline(input: &InputOptions, config: RunConfig) -> Result<Pipeline> {
    for path in &input.reads {
        validate_file_exists(path, "reads")?;
    }
    for path in &input.refs {
        validate_file_exists(path, "reference")?;
    }

    let store = Arc::new(
        FileStore::open(&input.store)
            .with_context(|| format!("opening store {}", input.store.display()))?,
    );
    let provider = Arc::new(FastaReferenceProvider::new(&input.refs, input.max_part_bytes)?);

    let read_files = input.reads.clone();
    let sources: SourceFactory = Box::new(move || {
        read_files
            .iter()
            .map(|path| {
                FastxReader::open(path).map(|reader| Box::new(reader) as Box<dyn ReadSource>)
            })
            .collect()
    });

    Ok(Pipeline::new(config, store, provider, sources)?)
}
