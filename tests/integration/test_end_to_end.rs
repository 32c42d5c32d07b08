//! End-to-end run over real files: FASTQ reads, a FASTA reference, the
//! file-backed store, and the stock seed-search and statistics callbacks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use refsieve_lib::config::RunConfig;
use refsieve_lib::fastx::{FastxReader, ReadSource};
use refsieve_lib::pipeline::{AlignFn, Pipeline, ReportFn, SourceFactory};
use refsieve_lib::read::{ReadResult, ReadUnit};
use refsieve_lib::refs::FastaReferenceProvider;
use refsieve_lib::search::{compute_stats, seed_search};
use refsieve_lib::store::{FileStore, KvStore};
use tempfile::TempDir;

use crate::helpers::fastx_files::{write_fasta, write_fastq};

/// 64 bases, no adjacent repeated A or T (so poly-A / poly-T never matches),
/// leading 6-mer unique within the sequence.
const REFERENCE: &str = "ACGGTAGCATCAGATGCGTACTGACATGCAGTCGATGATCGAGCTAGCTACGATCGTAGCATGA";

fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            _ => 'C',
        })
        .collect()
}

#[test]
fn test_full_run_over_files() {
    let dir = TempDir::new().unwrap();
    let refs_path = write_fasta(dir.path(), "db.fasta", &[("ref0", REFERENCE)]);

    // 40 mapped reads: exact 12-base windows of the reference, so both
    // non-overlapping 6-mer seeds occur.
    let mut mapped: Vec<(String, String)> = (0..40)
        .map(|i| (format!("mapped_{i}"), REFERENCE[i..i + 12].to_string()))
        .collect();
    // One reverse-strand read, matched on the second pass.
    mapped.push(("rc_read".to_string(), reverse_complement(&REFERENCE[4..16])));
    // One de novo candidate: a single matching seed, then garbage.
    let denovo = ("denovo_read".to_string(), format!("{}TTTTTT", &REFERENCE[0..6]));
    // 10 unmapped reads: poly-T never matches either strand.
    let unmapped: Vec<(String, String)> =
        (0..10).map(|i| (format!("unmapped_{i}"), "T".repeat(12))).collect();

    let mut entries: Vec<(&str, &str)> = Vec::new();
    for (h, s) in &mapped {
        entries.push((h.as_str(), s.as_str()));
    }
    entries.push((denovo.0.as_str(), denovo.1.as_str()));
    for (h, s) in &unmapped {
        entries.push((h.as_str(), s.as_str()));
    }
    let num_reads = entries.len() as u64;
    // Split across two input files, one reader each.
    let half = entries.len() / 2;
    let reads_a = write_fastq(dir.path(), "reads_1.fastq", &entries[..half]);
    let reads_b = write_fastq(dir.path(), "reads_2.fastq", &entries[half..]);

    let store_path = dir.path().join("run.kvdb");
    let store: Arc<dyn KvStore> = Arc::new(FileStore::open(&store_path).unwrap());
    let provider = Arc::new(FastaReferenceProvider::new(&[refs_path], 1 << 20).unwrap());
    let files = vec![reads_a, reads_b];
    let sources: SourceFactory = Box::new(move || {
        files
            .iter()
            .map(|p| FastxReader::open(p).map(|r| Box::new(r) as Box<dyn ReadSource>))
            .collect()
    });

    let config = RunConfig {
        num_read_threads: 2,
        num_proc_threads: 4,
        num_write_threads: 2,
        queue_capacity: 8,
        seed_len: 6,
        min_seed_hits: 2,
        ..RunConfig::default()
    };
    let pipeline = Pipeline::new(config, Arc::clone(&store), provider, sources).unwrap();

    let align: AlignFn = Arc::new(seed_search);
    pipeline.run_align(&align).unwrap();
    let postprocess: AlignFn = Arc::new(compute_stats);
    pipeline.run_postprocess(&postprocess).unwrap();

    let stats = pipeline.stats();
    assert_eq!(stats.total_reads.load(Ordering::Relaxed), num_reads);
    assert_eq!(stats.total_mapped.load(Ordering::Relaxed), 41);
    assert_eq!(stats.total_denovo.load(Ordering::Relaxed), 1);
    assert_eq!(stats.matched_per_index[0].load(Ordering::Relaxed), 41);
    assert_eq!(stats.otu_map.lock().get("ref0").unwrap(), &vec!["denovo_read".to_string()]);
    assert!(stats.stats_done.load(Ordering::Relaxed));

    // Stored results: one entry per read with at least one alignment,
    // nothing for the unmapped reads.
    let mut hits = 0;
    let mut misses = 0;
    for id in 0..num_reads {
        match store.get(&ReadUnit::key(id)).unwrap() {
            Some(bytes) => {
                let result: ReadResult = serde_json::from_slice(&bytes).unwrap();
                assert!(!result.alignments.is_empty());
                if result.hit {
                    hits += 1;
                } else {
                    assert!(result.hit_denovo);
                    misses += 1;
                }
            }
            None => misses += 1,
        }
    }
    assert_eq!(hits, 41);
    assert_eq!(misses, 11);

    // Report sweep: every hit is reported exactly once.
    let reported = Arc::new(AtomicU64::new(0));
    let report: ReportFn = {
        let reported = Arc::clone(&reported);
        Arc::new(move |batch, _, _| {
            reported.fetch_add(batch.iter().filter(|r| r.hit).count() as u64, Ordering::SeqCst);
        })
    };
    pipeline.run_report(&report).unwrap();
    assert_eq!(reported.load(Ordering::SeqCst), 41);
}
