//! The read unit flowing through the pipeline queues.
//!
//! A [`ReadUnit`] is created by a reader role, mutated by processor roles
//! (strand flips, seed accumulation, hit flags), and consumed by a writer
//! role, which persists its [`ReadResult`] to the durable store. A sentinel
//! read (`is_empty`) carries no payload and exists purely as a queue-control
//! signal.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::store::KvStore;

/// A transient seed match recorded during one strand pass.
///
/// Cleared at the start of every strand pass; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedHit {
    /// Index of the reference sequence within the loaded part.
    pub ref_id: u32,
    /// Offset of the match within the reference sequence.
    pub ref_pos: usize,
    /// Offset of the seed within the read.
    pub read_pos: usize,
}

/// One alignment of a read against a reference sequence.
///
/// Unlike [`SeedHit`], alignments persist across strand passes and phases and
/// are part of the serialized per-read result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Reference index the alignment belongs to.
    pub index_num: u16,
    /// Part of the reference index that was resident when aligning.
    pub part: u16,
    /// Reference sequence within the part.
    pub ref_id: u32,
    /// Name of the reference sequence (for reporting).
    pub ref_name: String,
    /// Start of the matched region on the reference.
    pub ref_begin: usize,
    /// Start of the matched region on the read.
    pub read_begin: usize,
    /// Length of the matched span on the read.
    pub length: usize,
    /// Match score (seed count for the default search callback).
    pub score: i32,
    /// True when the read was in forward orientation for this alignment.
    pub forward: bool,
}

/// The serialized per-read result stored in the key-value store.
///
/// These are exactly the fields a restarted run needs: the checkpoint phase
/// (`last_index`, `last_part`), the hit flags, and the accumulated alignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    /// Reference index of the last phase that fully processed this read.
    pub last_index: u16,
    /// Part of the last phase that fully processed this read.
    pub last_part: u16,
    /// The read matched a reference above threshold.
    pub hit: bool,
    /// The read matched below threshold and is a de novo clustering candidate.
    pub hit_denovo: bool,
    /// All alignments accumulated so far.
    pub alignments: Vec<Alignment>,
}

/// One sequencing read (or a sentinel) moving through the pipeline.
#[derive(Debug, Clone)]
pub struct ReadUnit {
    /// Stable identity; doubles as the store key, so it must be identical
    /// across runs for resumability to work.
    pub id: u64,
    /// Header line without the leading `>` / `@`.
    pub header: String,
    /// Nucleotide sequence, possibly reverse-complemented in place.
    pub sequence: Vec<u8>,
    /// Phred qualities for FASTQ input; reversed together with the sequence.
    pub quality: Option<Vec<u8>>,
    /// Sentinel marker: no payload, queue-control only.
    pub is_empty: bool,
    /// The read is well-formed (non-empty, recognized bases).
    pub is_valid: bool,
    /// A prior run's result was restored from the store.
    pub is_restored: bool,
    /// Checkpoint: reference index of the last fully processed phase.
    pub last_index: u16,
    /// Checkpoint: part of the last fully processed phase.
    pub last_part: u16,
    /// Current strand orientation.
    pub reversed: bool,
    /// Matched a reference above threshold.
    pub hit: bool,
    /// Below-threshold match, de novo clustering candidate.
    pub hit_denovo: bool,
    /// Per-pass seed accumulator; cleared at the start of each strand pass.
    pub seed_hits: Vec<SeedHit>,
    /// Cross-phase alignment state; persists until serialized by the writer.
    pub alignments: Vec<Alignment>,
}

impl ReadUnit {
    /// Create a read from raw input, validating the sequence.
    ///
    /// A read is valid when its sequence is non-empty, consists of recognized
    /// nucleotide codes, and any quality string matches the sequence length.
    #[must_use]
    pub fn new(id: u64, header: String, sequence: Vec<u8>, quality: Option<Vec<u8>>) -> Self {
        let is_valid = !sequence.is_empty()
            && sequence.iter().all(|b| is_nucleotide(*b))
            && quality.as_ref().is_none_or(|q| q.len() == sequence.len());
        Self {
            id,
            header,
            sequence,
            quality,
            is_empty: false,
            is_valid,
            is_restored: false,
            last_index: 0,
            last_part: 0,
            reversed: false,
            hit: false,
            hit_denovo: false,
            seed_hits: Vec::new(),
            alignments: Vec::new(),
        }
    }

    /// Create the sentinel read used to signal "no data available".
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            id: 0,
            header: String::new(),
            sequence: Vec::new(),
            quality: None,
            is_empty: true,
            is_valid: false,
            is_restored: false,
            last_index: 0,
            last_part: 0,
            reversed: false,
            hit: false,
            hit_denovo: false,
            seed_hits: Vec::new(),
            alignments: Vec::new(),
        }
    }

    /// Store key for this read's result blob.
    #[must_use]
    pub fn key(id: u64) -> String {
        id.to_string()
    }

    /// Reverse-complement the sequence in place and flip the orientation flag.
    ///
    /// Qualities, when present, are reversed to stay aligned with the bases.
    pub fn reverse_complement(&mut self) {
        self.sequence.reverse();
        for base in &mut self.sequence {
            *base = complement(*base);
        }
        if let Some(quality) = &mut self.quality {
            quality.reverse();
        }
        self.reversed = !self.reversed;
    }

    /// Re-initialize per-pass transient state.
    ///
    /// Called at the start of every strand pass so no seed hits leak from the
    /// previous pass. Cross-phase state (`alignments`, flags) is untouched.
    pub fn begin_strand_pass(&mut self) {
        self.seed_hits.clear();
    }

    /// Drop any restored alignments recorded for the given phase.
    ///
    /// A restored read whose checkpoint does not match the current phase is
    /// re-processed; clearing that phase's prior alignments first keeps the
    /// result free of duplicates.
    pub fn begin_phase(&mut self, index_num: u16, part: u16) {
        self.alignments.retain(|a| !(a.index_num == index_num && a.part == part));
    }

    /// The serialized result, or `None` when there is nothing worth storing.
    ///
    /// Reads without any alignment produce no store entry, matching the
    /// restore path which treats a missing key as "not yet processed".
    #[must_use]
    pub fn result(&self) -> Option<ReadResult> {
        if self.alignments.is_empty() {
            return None;
        }
        Some(ReadResult {
            last_index: self.last_index,
            last_part: self.last_part,
            hit: self.hit,
            hit_denovo: self.hit_denovo,
            alignments: self.alignments.clone(),
        })
    }

    /// Restore a prior run's result from the store, if any.
    ///
    /// Returns whether a checkpoint was found. A missing entry is not an
    /// error; the read simply stays unrestored and is processed normally.
    pub fn restore(&mut self, store: &dyn KvStore) -> Result<bool> {
        let Some(bytes) = store.get(&Self::key(self.id))? else {
            self.is_restored = false;
            return Ok(false);
        };
        let result: ReadResult = serde_json::from_slice(&bytes)?;
        self.last_index = result.last_index;
        self.last_part = result.last_part;
        self.hit = result.hit;
        self.hit_denovo = result.hit_denovo;
        self.alignments = result.alignments;
        self.is_restored = true;
        Ok(true)
    }
}

/// True for codes the validity check accepts (IUPAC nucleotides, upper or lower).
fn is_nucleotide(base: u8) -> bool {
    matches!(
        base.to_ascii_uppercase(),
        b'A' | b'C' | b'G' | b'T' | b'U' | b'N' | b'R' | b'Y' | b'S' | b'W' | b'K' | b'M'
    )
}

/// Complement of a nucleotide code, preserving case; ambiguity codes map to N.
fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' | b'u' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'n' => b'n',
        _ => b'N',
    }
}
