//! Custom error types for refsieve operations.

use thiserror::Error;

/// Result type alias for refsieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Error type for refsieve operations
#[derive(Error, Debug)]
pub enum SieveError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "FASTA", "FASTQ")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Requested reference index or part does not exist
    #[error("Reference index {index_num} part {part} not found")]
    ReferenceNotFound {
        /// The reference index number
        index_num: u16,
        /// The part number within the index
        part: u16,
    },

    /// Key-value store failure
    #[error("Key-value store error: {0}")]
    Store(String),

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization failure for result or checkpoint blobs
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
