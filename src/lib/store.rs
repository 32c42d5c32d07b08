//! Durable key-value store for per-read results and the statistics checkpoint.
//!
//! The pipeline only needs `put` and `get`; the [`KvStore`] trait keeps the
//! backend swappable. [`FileStore`] is the production backend: an append-only
//! log with an in-memory offset index, rebuilt by replay on open with
//! last-write-wins semantics. [`MemoryStore`] backs tests.
//!
//! Concurrent `put` calls from multiple writer threads are safe; both
//! backends serialize access internally.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::errors::{Result, SieveError};

/// Minimal durable key-value contract used by the pipeline.
pub trait KvStore: Send + Sync {
    /// Persist `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Fetch the latest value for `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// In-memory store for tests and debug runs.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    /// True when no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.map.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.lock().get(key).cloned())
    }
}

/// Record header: key length and value length, both little-endian u32.
const RECORD_HEADER_LEN: usize = 8;

struct FileStoreInner {
    file: File,
    /// Append position; always the logical end of the log.
    offset: u64,
    /// Key -> (value offset, value length); last write wins.
    index: HashMap<String, (u64, u32)>,
}

/// Log-structured file-backed store.
///
/// Every `put` appends one record (`key_len`, `val_len`, key bytes, value
/// bytes) and updates the in-memory index. On open the log is replayed to
/// rebuild the index; a partial record at the tail (crashed writer) is
/// truncated away.
pub struct FileStore {
    inner: Mutex<FileStoreInner>,
    path: PathBuf,
}

impl FileStore {
    /// Open or create a store at `path`, replaying any existing log.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened or read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&path)?;

        let mut index = HashMap::new();
        let offset = replay(&mut file, &mut index)?;
        // Drop a partial tail record left by a crashed writer.
        file.set_len(offset)?;
        file.seek(SeekFrom::Start(offset))?;

        Ok(Self { inner: Mutex::new(FileStoreInner { file, offset, index }), path })
    }

    /// Path of the backing log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct keys currently indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    /// True when no keys are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().index.is_empty()
    }
}

impl KvStore for FileStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let key_bytes = key.as_bytes();
        let key_len = u32::try_from(key_bytes.len())
            .map_err(|_| SieveError::Store(format!("key too long: {} bytes", key_bytes.len())))?;
        let val_len = u32::try_from(value.len())
            .map_err(|_| SieveError::Store(format!("value too long: {} bytes", value.len())))?;

        let mut record = Vec::with_capacity(RECORD_HEADER_LEN + key_bytes.len() + value.len());
        record.extend_from_slice(&key_len.to_le_bytes());
        record.extend_from_slice(&val_len.to_le_bytes());
        record.extend_from_slice(key_bytes);
        record.extend_from_slice(value);

        let mut inner = self.inner.lock();
        let record_offset = inner.offset;
        inner.file.seek(SeekFrom::Start(record_offset))?;
        inner.file.write_all(&record)?;
        let value_offset = record_offset + RECORD_HEADER_LEN as u64 + u64::from(key_len);
        inner.index.insert(key.to_string(), (value_offset, val_len));
        inner.offset = record_offset + record.len() as u64;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut inner = self.inner.lock();
        let Some(&(offset, len)) = inner.index.get(key) else {
            return Ok(None);
        };
        inner.file.seek(SeekFrom::Start(offset))?;
        let mut value = vec![0u8; len as usize];
        inner.file.read_exact(&mut value)?;
        Ok(Some(value))
    }
}

/// Replay the log sequentially, filling `index` and returning the offset of
/// the first byte past the last complete record.
fn replay(file: &mut File, index: &mut HashMap<String, (u64, u32)>) -> Result<u64> {
    let file_len = file.metadata()?.len();
    file.seek(SeekFrom::Start(0))?;
    let mut offset: u64 = 0;

    loop {
        let mut header = [0u8; RECORD_HEADER_LEN];
        if offset + RECORD_HEADER_LEN as u64 > file_len {
            break;
        }
        file.read_exact(&mut header)?;
        let key_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let val_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let record_len = RECORD_HEADER_LEN as u64 + u64::from(key_len) + u64::from(val_len);
        if offset + record_len > file_len {
            break;
        }

        let mut key = vec![0u8; key_len as usize];
        file.read_exact(&mut key)?;
        let key = String::from_utf8(key)
            .map_err(|_| SieveError::Store("corrupt record key".to_string()))?;

        let value_offset = offset + RECORD_HEADER_LEN as u64 + u64::from(key_len);
        index.insert(key, (value_offset, val_len));

        file.seek(SeekFrom::Start(offset + record_len))?;
        offset += record_len;
    }

    Ok(offset)
}
