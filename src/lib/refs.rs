//! Reference data loading, split into memory-bounded parts.
//!
//! A phase is one (reference-index, part) pair; the orchestrator loads
//! exactly one part at a time through a [`ReferenceProvider`] and releases it
//! at phase teardown. [`FastaReferenceProvider`] splits each reference FASTA
//! into parts by a byte budget so a part never exceeds the configured
//! residency bound.

use std::path::{Path, PathBuf};

use crate::errors::{Result, SieveError};
use crate::fastx::read_fasta;

/// One reference sequence resident in memory.
#[derive(Debug, Clone)]
pub struct RefSequence {
    /// Sequence name from the FASTA header.
    pub name: String,
    /// Nucleotide bytes, uppercased on load.
    pub sequence: Vec<u8>,
}

/// The reference data for one resident phase.
#[derive(Debug)]
pub struct References {
    /// Reference index this part belongs to.
    pub index_num: u16,
    /// Part number within the index.
    pub part: u16,
    /// The sequences of this part.
    pub sequences: Vec<RefSequence>,
}

/// Provider of reference parts for the orchestrator.
///
/// The orchestrator calls `load` exactly once per phase and drops the result
/// at teardown, so implementations must not cache loaded parts.
pub trait ReferenceProvider: Send + Sync {
    /// Number of reference indexes (databases).
    fn num_indexes(&self) -> u16;

    /// Number of parts for the given index.
    fn num_parts(&self, index_num: u16) -> u16;

    /// Display name of the given index, for the run summary.
    fn index_name(&self, index_num: u16) -> &str;

    /// Load one part into memory.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::ReferenceNotFound`] for an out-of-range phase,
    /// or an I/O error from the underlying source.
    fn load(&self, index_num: u16, part: u16) -> Result<References>;
}

/// A contiguous range of sequences forming one part.
#[derive(Debug, Clone, Copy)]
struct PartRange {
    start: usize,
    count: usize,
}

/// FASTA-backed reference provider.
///
/// Construction scans every file once to compute part boundaries; `load`
/// re-reads only the requested range.
pub struct FastaReferenceProvider {
    files: Vec<PathBuf>,
    names: Vec<String>,
    parts: Vec<Vec<PartRange>>,
}

impl FastaReferenceProvider {
    /// Scan `files` and plan parts of at most `max_part_bytes` sequence bytes.
    ///
    /// A part always contains at least one sequence, so a single sequence
    /// larger than the budget still loads (as a part of its own).
    ///
    /// # Errors
    ///
    /// Returns an error for unreadable or empty reference files.
    pub fn new(files: &[PathBuf], max_part_bytes: u64) -> Result<Self> {
        let mut parts = Vec::with_capacity(files.len());
        let mut names = Vec::with_capacity(files.len());

        for file in files {
            let sequences = read_fasta(file)?;
            if sequences.is_empty() {
                return Err(SieveError::InvalidFileFormat {
                    file_type: "FASTA".to_string(),
                    path: file.display().to_string(),
                    reason: "reference file contains no sequences".to_string(),
                });
            }

            let mut ranges = Vec::new();
            let mut start = 0usize;
            let mut bytes = 0u64;
            for (i, (_, sequence)) in sequences.iter().enumerate() {
                let len = sequence.len() as u64;
                if i > start && bytes + len > max_part_bytes {
                    ranges.push(PartRange { start, count: i - start });
                    start = i;
                    bytes = 0;
                }
                bytes += len;
            }
            ranges.push(PartRange { start, count: sequences.len() - start });

            parts.push(ranges);
            names.push(
                file.file_stem().map_or_else(|| file.display().to_string(), |s| {
                    s.to_string_lossy().into_owned()
                }),
            );
        }

        Ok(Self { files: files.to_vec(), names, parts })
    }

    fn part_range(&self, index_num: u16, part: u16) -> Result<PartRange> {
        self.parts
            .get(index_num as usize)
            .and_then(|ranges| ranges.get(part as usize))
            .copied()
            .ok_or(SieveError::ReferenceNotFound { index_num, part })
    }

    /// The reference file backing the given index.
    #[must_use]
    pub fn file(&self, index_num: u16) -> Option<&Path> {
        self.files.get(index_num as usize).map(PathBuf::as_path)
    }
}

impl ReferenceProvider for FastaReferenceProvider {
    fn num_indexes(&self) -> u16 {
        self.files.len() as u16
    }

    fn num_parts(&self, index_num: u16) -> u16 {
        self.parts.get(index_num as usize).map_or(0, |ranges| ranges.len() as u16)
    }

    fn index_name(&self, index_num: u16) -> &str {
        self.names.get(index_num as usize).map_or("", String::as_str)
    }

    fn load(&self, index_num: u16, part: u16) -> Result<References> {
        let range = self.part_range(index_num, part)?;
        let file = &self.files[index_num as usize];
        let sequences = read_fasta(file)?
            .into_iter()
            .skip(range.start)
            .take(range.count)
            .map(|(name, mut sequence)| {
                sequence.make_ascii_uppercase();
                RefSequence { name, sequence }
            })
            .collect();
        Ok(References { index_num, part, sequences })
    }
}
