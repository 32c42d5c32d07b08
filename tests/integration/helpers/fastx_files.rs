//! Writers for small FASTA/FASTQ fixture files.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a FASTA file of (header, sequence) entries.
pub fn write_fasta(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).expect("Failed to create FASTA file");
    for (header, sequence) in entries {
        writeln!(file, ">{header}").expect("Failed to write FASTA record");
        writeln!(file, "{sequence}").expect("Failed to write FASTA record");
    }
    path
}

/// Write a FASTQ file of (header, sequence) entries with constant qualities.
pub fn write_fastq(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).expect("Failed to create FASTQ file");
    for (header, sequence) in entries {
        let quality = "I".repeat(sequence.len());
        writeln!(file, "@{header}\n{sequence}\n+\n{quality}")
            .expect("Failed to write FASTQ record");
    }
    path
}

/// Write a gzip-compressed FASTQ file of (header, sequence) entries.
pub fn write_fastq_gz(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("Failed to create FASTQ file");
    let mut encoder = GzEncoder::new(file, Compression::default());
    for (header, sequence) in entries {
        let quality = "I".repeat(sequence.len());
        writeln!(encoder, "@{header}\n{sequence}\n+\n{quality}")
            .expect("Failed to write FASTQ record");
    }
    encoder.finish().expect("Failed to finish gzip stream");
    path
}
