//! Strand coverage tests: pass counts, orientation at callback entry, and
//! per-pass accumulator hygiene across full pipeline runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use refsieve_lib::config::RunConfig;
use refsieve_lib::pipeline::{AlignFn, Pipeline};
use refsieve_lib::store::{KvStore, MemoryStore};

use crate::helpers::pipeline_setup::{raw, vec_factory, FixedProvider};

fn config(forward: bool, reverse: bool) -> RunConfig {
    RunConfig {
        num_read_threads: 1,
        num_proc_threads: 1,
        num_write_threads: 1,
        queue_capacity: 8,
        forward,
        reverse,
        ..RunConfig::default()
    }
}

fn run(forward: bool, reverse: bool, callback: &AlignFn) {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let provider = FixedProvider::single(b"ACGTACGT");
    let reads = vec![raw("r0", b"AAACCCGT")];
    let pipeline =
        Pipeline::new(config(forward, reverse), store, provider, vec_factory(reads)).unwrap();
    pipeline.run_align(callback).unwrap();
}

fn counting(calls: Arc<AtomicU64>, orientations: Arc<parking_lot::Mutex<Vec<bool>>>) -> AlignFn {
    Arc::new(move |read, _, _, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        orientations.lock().push(read.reversed);
        assert!(read.seed_hits.is_empty(), "stale seed hits at pass entry");
        // Leave something behind to prove the next pass starts clean.
        read.seed_hits.push(refsieve_lib::read::SeedHit { ref_id: 0, ref_pos: 0, read_pos: 0 });
    })
}

#[test]
fn test_forward_only_single_pass() {
    let calls = Arc::new(AtomicU64::new(0));
    let orientations = Arc::new(parking_lot::Mutex::new(Vec::new()));
    run(true, false, &counting(Arc::clone(&calls), Arc::clone(&orientations)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*orientations.lock(), vec![false]);
}

#[test]
fn test_reverse_only_single_pass_flipped() {
    let calls = Arc::new(AtomicU64::new(0));
    let orientations = Arc::new(parking_lot::Mutex::new(Vec::new()));
    run(false, true, &counting(Arc::clone(&calls), Arc::clone(&orientations)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*orientations.lock(), vec![true]);
}

#[test]
fn test_neither_flag_searches_both_strands() {
    let calls = Arc::new(AtomicU64::new(0));
    let orientations = Arc::new(parking_lot::Mutex::new(Vec::new()));
    run(false, false, &counting(Arc::clone(&calls), Arc::clone(&orientations)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*orientations.lock(), vec![false, true]);
}

#[test]
fn test_both_flags_search_both_strands() {
    let calls = Arc::new(AtomicU64::new(0));
    let orientations = Arc::new(parking_lot::Mutex::new(Vec::new()));
    run(true, true, &counting(Arc::clone(&calls), Arc::clone(&orientations)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*orientations.lock(), vec![false, true]);
}

#[test]
fn test_second_pass_sees_reverse_complement() {
    let sequences = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let callback: AlignFn = {
        let sequences = Arc::clone(&sequences);
        Arc::new(move |read, _, _, _| {
            sequences.lock().push(read.sequence.clone());
        })
    };
    run(false, false, &callback);

    let sequences = sequences.lock();
    assert_eq!(sequences[0], b"AAACCCGT");
    assert_eq!(sequences[1], b"AAACCCGT".iter().rev().map(|b| match b {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        _ => b'C',
    }).collect::<Vec<u8>>());
}

#[test]
fn test_passes_repeat_per_phase() {
    // Two parts, both strands: 2 passes x 2 phases per read.
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let provider = FixedProvider::with_parts(vec![
        vec![("p0".to_string(), b"AAAA".to_vec())],
        vec![("p1".to_string(), b"CCCC".to_vec())],
    ]);
    let reads = vec![raw("r0", b"AAACCCGT")];
    let calls = Arc::new(AtomicU64::new(0));
    let orientations = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let pipeline = Pipeline::new(
        config(false, false),
        store,
        provider,
        vec_factory(reads),
    )
    .unwrap();
    pipeline.run_align(&counting(Arc::clone(&calls), Arc::clone(&orientations))).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(*orientations.lock(), vec![false, true, false, true]);
}
