//! In-memory pipeline fixtures: a fixed reference provider and source
//! factories over generated reads.

use std::sync::Arc;

use refsieve_lib::errors::{Result, SieveError};
use refsieve_lib::fastx::{RawRead, ReadSource, VecSource};
use refsieve_lib::pipeline::SourceFactory;
use refsieve_lib::refs::{RefSequence, ReferenceProvider, References};

/// Reference provider over fixed in-memory parts.
///
/// `parts[index][part]` lists the (name, sequence) pairs of one part.
pub struct FixedProvider {
    pub names: Vec<String>,
    pub parts: Vec<Vec<Vec<(String, Vec<u8>)>>>,
}

impl FixedProvider {
    /// One index with the given parts.
    pub fn with_parts(parts: Vec<Vec<(String, Vec<u8>)>>) -> Arc<Self> {
        Arc::new(Self { names: vec!["db".to_string()], parts: vec![parts] })
    }

    /// One index, one part, one sequence.
    pub fn single(sequence: &[u8]) -> Arc<Self> {
        Self::with_parts(vec![vec![("ref0".to_string(), sequence.to_vec())]])
    }
}

impl ReferenceProvider for FixedProvider {
    fn num_indexes(&self) -> u16 {
        self.parts.len() as u16
    }

    fn num_parts(&self, index_num: u16) -> u16 {
        self.parts.get(index_num as usize).map_or(0, |p| p.len() as u16)
    }

    fn index_name(&self, index_num: u16) -> &str {
        self.names.get(index_num as usize).map_or("", String::as_str)
    }

    fn load(&self, index_num: u16, part: u16) -> Result<References> {
        let sequences = self
            .parts
            .get(index_num as usize)
            .and_then(|p| p.get(part as usize))
            .ok_or(SieveError::ReferenceNotFound { index_num, part })?;
        Ok(References {
            index_num,
            part,
            sequences: sequences
                .iter()
                .map(|(name, seq)| RefSequence { name: name.clone(), sequence: seq.clone() })
                .collect(),
        })
    }
}

/// A raw read fixture.
pub fn raw(header: &str, sequence: &[u8]) -> RawRead {
    RawRead { header: header.to_string(), sequence: sequence.to_vec(), quality: None }
}

/// Factory yielding one [`VecSource`] over the given reads, fresh each phase.
pub fn vec_factory(reads: Vec<RawRead>) -> SourceFactory {
    Box::new(move || Ok(vec![Box::new(VecSource::new(reads.clone())) as Box<dyn ReadSource>]))
}

/// Factory splitting the reads round-robin across `n` sources.
pub fn split_factory(reads: Vec<RawRead>, n: usize) -> SourceFactory {
    Box::new(move || {
        let mut buckets: Vec<Vec<RawRead>> = vec![Vec::new(); n];
        for (i, read) in reads.iter().enumerate() {
            buckets[i % n].push(read.clone());
        }
        Ok(buckets
            .into_iter()
            .map(|bucket| Box::new(VecSource::new(bucket)) as Box<dyn ReadSource>)
            .collect())
    })
}
