//! Default search callbacks: seed matching for the alignment sweep and
//! statistics accounting for the post-processing sweep.
//!
//! The pipeline itself is search-agnostic; these are the stock callbacks the
//! `align` and `stats` commands wire in. [`seed_search`] is a deliberately
//! simple exact k-mer matcher: the read is cut into non-overlapping seeds and
//! each seed is scanned against every resident reference sequence. The
//! reference with the most seed hits decides the read's fate against the
//! `min_seed_hits` threshold.

use crate::config::RunConfig;
use crate::read::{Alignment, ReadUnit, SeedHit};
use crate::refs::References;
use crate::stats::ReadStats;

/// Alignment callback for one strand pass.
///
/// Fills the read's seed accumulator, then reduces it to at most one
/// [`Alignment`] against the best-matching reference of the resident part.
/// A best count at or above `min_seed_hits` marks the read as a hit; any
/// smaller non-zero count marks it as a de novo candidate unless an earlier
/// pass or phase already produced a hit.
pub fn seed_search(read: &mut ReadUnit, refs: &References, _stats: &ReadStats, config: &RunConfig) {
    let seed_len = config.seed_len;
    if read.sequence.len() < seed_len || refs.sequences.is_empty() {
        return;
    }

    let query = read.sequence.to_ascii_uppercase();
    let mut read_pos = 0;
    while read_pos + seed_len <= query.len() {
        let seed = &query[read_pos..read_pos + seed_len];
        for (ref_id, reference) in refs.sequences.iter().enumerate() {
            for ref_pos in find_all(&reference.sequence, seed) {
                read.seed_hits.push(SeedHit { ref_id: ref_id as u32, ref_pos, read_pos });
            }
        }
        read_pos += seed_len;
    }

    let mut counts = vec![0usize; refs.sequences.len()];
    for hit in &read.seed_hits {
        counts[hit.ref_id as usize] += 1;
    }
    // Best reference: most seed hits, lowest id on ties.
    let Some((best_ref, &best_count)) = counts
        .iter()
        .enumerate()
        .max_by_key(|(id, count)| (**count, std::cmp::Reverse(*id)))
    else {
        return;
    };
    if best_count == 0 {
        return;
    }

    let best_hits: Vec<&SeedHit> =
        read.seed_hits.iter().filter(|h| h.ref_id as usize == best_ref).collect();
    let first = best_hits.iter().min_by_key(|h| h.read_pos).copied();
    let last = best_hits.iter().max_by_key(|h| h.read_pos).copied();
    let (Some(first), Some(last)) = (first, last) else {
        return;
    };

    read.alignments.push(Alignment {
        index_num: refs.index_num,
        part: refs.part,
        ref_id: best_ref as u32,
        ref_name: refs.sequences[best_ref].name.clone(),
        ref_begin: first.ref_pos,
        read_begin: first.read_pos,
        length: last.read_pos + seed_len - first.read_pos,
        score: i32::try_from(best_count).unwrap_or(i32::MAX),
        forward: !read.reversed,
    });

    if best_count >= config.min_seed_hits {
        read.hit = true;
        read.hit_denovo = false;
    } else if !read.hit {
        read.hit_denovo = true;
    }
}

/// Post-processing callback: fold one read into the run statistics.
///
/// Counts a read only during the phase matching its checkpoint, so a read is
/// accounted for exactly once across all (index, part) sweeps regardless of
/// how many phases touched it.
pub fn compute_stats(
    read: &mut ReadUnit,
    refs: &References,
    stats: &ReadStats,
    _config: &RunConfig,
) {
    if read.last_index != refs.index_num || read.last_part != refs.part {
        return;
    }
    let best = read.alignments.iter().max_by_key(|a| a.score);
    if read.hit {
        if let Some(best) = best {
            stats.record_match(best.index_num as usize);
        }
    } else if read.hit_denovo {
        if let Some(best) = best {
            stats.record_denovo(&best.ref_name, &read.header);
        }
    }
}

/// All start offsets of `needle` in `haystack`.
fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(i, _)| i)
        .collect()
}
