//! FASTA/FASTQ parsing and the read-source abstraction feeding the pipeline.
//!
//! A [`ReadSource`] yields raw reads plus an end-of-input signal (`None`);
//! reader roles convert this into queue pushes plus a final pusher decrement.
//! [`FastxReader`] is the file-backed source, auto-detecting FASTA vs FASTQ
//! from the first record marker and decompressing gzip input transparently.
//! [`VecSource`] backs tests and embedding.

use flate2::read::MultiGzDecoder;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::{Result, SieveError};

/// One raw read pulled from an input source, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRead {
    /// Header line without the leading marker character.
    pub header: String,
    /// Nucleotide sequence bytes.
    pub sequence: Vec<u8>,
    /// Phred quality bytes for FASTQ records.
    pub quality: Option<Vec<u8>>,
}

/// A sequence of raw reads plus an end-of-input signal.
pub trait ReadSource: Send {
    /// Pull the next read, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error for structurally malformed input (e.g. a truncated
    /// FASTQ record). Per-base validity is judged later, by the read unit.
    fn next_read(&mut self) -> Result<Option<RawRead>>;
}

/// In-memory read source.
pub struct VecSource {
    reads: VecDeque<RawRead>,
}

impl VecSource {
    /// Wrap a list of reads as a source.
    #[must_use]
    pub fn new(reads: Vec<RawRead>) -> Self {
        Self { reads: reads.into() }
    }
}

impl ReadSource for VecSource {
    fn next_read(&mut self) -> Result<Option<RawRead>> {
        Ok(self.reads.pop_front())
    }
}

/// Input format, detected from the first record marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastxFormat {
    Fasta,
    Fastq,
}

/// Streaming FASTA/FASTQ reader.
///
/// FASTA sequences may span multiple lines; FASTQ records are the standard
/// four lines. Blank lines between records are tolerated.
pub struct FastxReader<R: BufRead> {
    reader: R,
    path: String,
    format: Option<FastxFormat>,
    /// Header line carried over from the previous FASTA record.
    pending_header: Option<String>,
    line_no: u64,
}

/// Leading bytes of a gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

impl FastxReader<Box<dyn BufRead + Send>> {
    /// Open a FASTA/FASTQ file, plain or gzip-compressed.
    ///
    /// Compression is detected from the gzip magic bytes rather than the file
    /// name, so a gzipped file without a `.gz` suffix still opens. Multi-member
    /// gzip (including BGZF output) is decoded across member boundaries.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened or read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = BufReader::new(File::open(path.as_ref())?);
        let gzipped = file.fill_buf()?.starts_with(&GZIP_MAGIC);
        let reader: Box<dyn BufRead + Send> = if gzipped {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(file)
        };
        Ok(Self::new(reader, path.as_ref().display().to_string()))
    }
}

impl<R: BufRead> FastxReader<R> {
    /// Wrap any buffered reader; `path` labels error messages.
    pub fn new(reader: R, path: String) -> Self {
        Self { reader, path, format: None, pending_header: None, line_no: 0 }
    }

    /// The detected format, once the first record marker has been seen.
    #[must_use]
    pub fn format(&self) -> Option<FastxFormat> {
        self.format
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn malformed(&self, reason: &str) -> SieveError {
        let file_type = match self.format {
            Some(FastxFormat::Fastq) => "FASTQ",
            _ => "FASTA",
        };
        SieveError::InvalidFileFormat {
            file_type: file_type.to_string(),
            path: self.path.clone(),
            reason: format!("{reason} (line {})", self.line_no),
        }
    }

    fn next_fasta(&mut self, header: String) -> Result<Option<RawRead>> {
        let mut sequence = Vec::new();
        loop {
            match self.read_line()? {
                None => break,
                Some(line) if line.starts_with('>') => {
                    self.pending_header = Some(line[1..].to_string());
                    break;
                }
                Some(line) => sequence.extend_from_slice(line.trim().as_bytes()),
            }
        }
        Ok(Some(RawRead { header, sequence, quality: None }))
    }

    fn next_fastq(&mut self, header: String) -> Result<Option<RawRead>> {
        let sequence = self
            .read_line()?
            .ok_or_else(|| self.malformed("missing sequence line"))?
            .into_bytes();
        let plus = self.read_line()?.ok_or_else(|| self.malformed("missing separator line"))?;
        if !plus.starts_with('+') {
            return Err(self.malformed("expected '+' separator"));
        }
        let quality =
            self.read_line()?.ok_or_else(|| self.malformed("missing quality line"))?.into_bytes();
        Ok(Some(RawRead { header, sequence, quality: Some(quality) }))
    }
}

impl<R: BufRead + Send> ReadSource for FastxReader<R> {
    fn next_read(&mut self) -> Result<Option<RawRead>> {
        let header = if let Some(pending) = self.pending_header.take() {
            pending
        } else {
            loop {
                match self.read_line()? {
                    None => return Ok(None),
                    Some(line) if line.is_empty() => {}
                    Some(line) if line.starts_with('>') => {
                        self.format.get_or_insert(FastxFormat::Fasta);
                        if self.format == Some(FastxFormat::Fastq) {
                            return Err(self.malformed("FASTA header in FASTQ input"));
                        }
                        break line[1..].to_string();
                    }
                    Some(line) if line.starts_with('@') => {
                        self.format.get_or_insert(FastxFormat::Fastq);
                        if self.format == Some(FastxFormat::Fasta) {
                            return Err(self.malformed("FASTQ header in FASTA input"));
                        }
                        break line[1..].to_string();
                    }
                    Some(_) => return Err(self.malformed("expected record header")),
                }
            }
        };

        match self.format {
            Some(FastxFormat::Fastq) => self.next_fastq(header),
            _ => self.next_fasta(header),
        }
    }
}

/// Read an entire FASTA file into (name, sequence) pairs.
///
/// Used by the reference provider, which needs whole sequences resident.
///
/// # Errors
///
/// Returns an error for unreadable or non-FASTA input.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<u8>)>> {
    let path_str = path.as_ref().display().to_string();
    let mut reader = FastxReader::open(&path)?;
    let mut sequences = Vec::new();
    while let Some(read) = reader.next_read()? {
        if read.quality.is_some() {
            return Err(SieveError::InvalidFileFormat {
                file_type: "FASTA".to_string(),
                path: path_str,
                reason: "expected FASTA, found FASTQ".to_string(),
            });
        }
        sequences.push((read.header, read.sequence));
    }
    Ok(sequences)
}
