//! Concurrency tests for the phase pipeline.
//!
//! These tests verify termination, data integrity, and counter consistency
//! under multi-threaded execution with small queues (heavy backpressure).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use refsieve_lib::config::RunConfig;
use refsieve_lib::pipeline::{AlignFn, Pipeline};
use refsieve_lib::read::{Alignment, ReadUnit};
use refsieve_lib::refs::ReferenceProvider;
use refsieve_lib::store::{KvStore, MemoryStore};

use crate::helpers::pipeline_setup::{raw, split_factory, vec_factory, FixedProvider};

fn config(readers: usize, procs: usize, writers: usize, capacity: usize) -> RunConfig {
    RunConfig {
        num_read_threads: readers,
        num_proc_threads: procs,
        num_write_threads: writers,
        queue_capacity: capacity,
        forward: true,
        ..RunConfig::default()
    }
}

/// Callback marking every read a hit, with one alignment for the phase.
fn hit_all(calls: Arc<AtomicU64>) -> AlignFn {
    Arc::new(move |read, refs, _, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        read.hit = true;
        read.alignments.push(Alignment {
            index_num: refs.index_num,
            part: refs.part,
            ref_id: 0,
            ref_name: refs.sequences[0].name.clone(),
            ref_begin: 0,
            read_begin: 0,
            length: read.sequence.len(),
            score: 1,
            forward: !read.reversed,
        });
    })
}

#[test]
fn test_every_read_processed_under_backpressure() {
    let reads: Vec<_> = (0..500).map(|i| raw(&format!("r{i}"), b"ACGTACGT")).collect();
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let provider = FixedProvider::single(b"ACGTACGT");

    // Queue capacity 2 forces constant blocking on both queues.
    let pipeline =
        Pipeline::new(config(1, 4, 2, 2), Arc::clone(&store), provider, vec_factory(reads))
            .unwrap();
    let calls = Arc::new(AtomicU64::new(0));
    pipeline.run_align(&hit_all(Arc::clone(&calls))).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 500);
    assert_eq!(pipeline.stats().total_reads.load(Ordering::Relaxed), 500);
    for id in 0..500u64 {
        assert!(store.get(&ReadUnit::key(id)).unwrap().is_some(), "read {id} missing");
    }
}

#[test]
fn test_multiple_readers_disjoint_stable_ids() {
    let reads: Vec<_> = (0..120).map(|i| raw(&format!("r{i}"), b"ACGTACGT")).collect();
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let provider = FixedProvider::single(b"ACGTACGT");

    let pipeline = Pipeline::new(
        config(3, 4, 2, 8),
        Arc::clone(&store),
        provider,
        split_factory(reads, 3),
    )
    .unwrap();
    let calls = Arc::new(AtomicU64::new(0));
    pipeline.run_align(&hit_all(calls)).unwrap();

    // Round-robin sources plus strided id assignment: read i gets id i.
    for id in 0..120u64 {
        assert!(store.get(&ReadUnit::key(id)).unwrap().is_some(), "read {id} missing");
    }
    assert!(store.get(&ReadUnit::key(120)).unwrap().is_none());
}

#[test]
fn test_invalid_reads_counted_not_processed() {
    let mut reads: Vec<_> = (0..20).map(|i| raw(&format!("r{i}"), b"ACGT")).collect();
    reads.insert(5, raw("bad1", b"XXXX"));
    reads.insert(15, raw("bad2", b""));
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let provider = FixedProvider::single(b"ACGT");

    let pipeline =
        Pipeline::new(config(1, 2, 1, 4), Arc::clone(&store), provider, vec_factory(reads))
            .unwrap();
    let calls = Arc::new(AtomicU64::new(0));
    pipeline.run_align(&hit_all(Arc::clone(&calls))).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 20);
    assert_eq!(pipeline.stats().total_reads.load(Ordering::Relaxed), 20);
    assert_eq!(pipeline.stats().invalid_reads.load(Ordering::Relaxed), 2);
}

#[test]
fn test_phase_sequencing_one_part_resident() {
    // Three parts; the callback records which part it sees, and that it
    // never sees two parts interleaved within one phase.
    let provider = FixedProvider::with_parts(vec![
        vec![("p0".to_string(), b"AAAA".to_vec())],
        vec![("p1".to_string(), b"CCCC".to_vec())],
        vec![("p2".to_string(), b"GGGG".to_vec())],
    ]);
    let reads: Vec<_> = (0..50).map(|i| raw(&format!("r{i}"), b"ACGT")).collect();
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let callback: AlignFn = {
        let order = Arc::clone(&order);
        Arc::new(move |_, refs, _, _| {
            order.lock().push(refs.part);
        })
    };
    let pipeline =
        Pipeline::new(config(1, 4, 1, 4), store, provider, vec_factory(reads)).unwrap();
    pipeline.run_align(&callback).unwrap();

    let order = order.lock();
    assert_eq!(order.len(), 150);
    // Strictly non-decreasing part numbers: phases never overlap.
    assert!(order.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_queue_drained_between_phases() {
    // Two parts over the same reads; if the queues were not reset between
    // phases, leftover reads or stale pusher counts would break the second
    // phase's accounting.
    let provider = FixedProvider::with_parts(vec![
        vec![("p0".to_string(), b"AAAA".to_vec())],
        vec![("p1".to_string(), b"CCCC".to_vec())],
    ]);
    let reads: Vec<_> = (0..200).map(|i| raw(&format!("r{i}"), b"ACGT")).collect();
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    let pipeline = Pipeline::new(
        config(1, 3, 2, 2),
        Arc::clone(&store),
        provider,
        vec_factory(reads),
    )
    .unwrap();
    let calls = Arc::new(AtomicU64::new(0));
    pipeline.run_align(&hit_all(Arc::clone(&calls))).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 400);
    // Each stored result carries both phases' alignments.
    let bytes = store.get(&ReadUnit::key(0)).unwrap().unwrap();
    let result: refsieve_lib::read::ReadResult = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result.alignments.len(), 2);
}

#[test]
fn test_provider_never_asked_to_cache() {
    // The provider is called exactly once per phase.
    struct CountingProvider {
        inner: Arc<FixedProvider>,
        loads: AtomicU64,
    }
    impl ReferenceProvider for CountingProvider {
        fn num_indexes(&self) -> u16 {
            self.inner.num_indexes()
        }
        fn num_parts(&self, index_num: u16) -> u16 {
            self.inner.num_parts(index_num)
        }
        fn index_name(&self, index_num: u16) -> &str {
            self.inner.index_name(index_num)
        }
        fn load(&self, index_num: u16, part: u16) -> refsieve_lib::errors::Result<refsieve_lib::refs::References> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(index_num, part)
        }
    }

    let provider = Arc::new(CountingProvider {
        inner: FixedProvider::with_parts(vec![
            vec![("p0".to_string(), b"AAAA".to_vec())],
            vec![("p1".to_string(), b"CCCC".to_vec())],
        ]),
        loads: AtomicU64::new(0),
    });
    let reads = vec![raw("r0", b"ACGT")];
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        config(1, 2, 1, 4),
        store,
        Arc::clone(&provider) as Arc<dyn ReferenceProvider>,
        vec_factory(reads),
    )
    .unwrap();
    let calls = Arc::new(AtomicU64::new(0));
    pipeline.run_align(&hit_all(calls)).unwrap();

    assert_eq!(provider.loads.load(Ordering::SeqCst), 2);
}
