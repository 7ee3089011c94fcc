use crate::errors::{DbError, DbResult};
use consensus_core::constants::HEADER_SIZE;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

const RECORD: u64 = HEADER_SIZE as u64;

/// One chain's file of back-to-back 80-byte header records.
///
/// Record `i` sits at byte `i * 80`. The file may contain sparse holes
/// (all-zero records) where headers are not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFile {
    path: PathBuf,
}

impl HeaderFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Number of whole records in the file; 0 if the file does not exist.
    pub fn record_count(&self) -> DbResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() / RECORD),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Record at `index`. `None` when it lies past the end or is an unfilled
    /// sparse hole.
    pub fn read_record(&self, index: u64) -> DbResult<Option<[u8; HEADER_SIZE]>> {
        let mut file = File::open(&self.path)?;
        let offset = index * RECORD;
        if offset + RECORD > file.metadata()?.len() {
            return Ok(None);
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut record = [0u8; HEADER_SIZE];
        file.read_exact(&mut record).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => DbError::Truncated { path: self.path.clone(), offset },
            _ => DbError::Io(e),
        })?;
        if record.iter().all(|b| *b == 0) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// `len` bytes starting at byte `offset`, cut short at end of file.
    pub fn read_range(&self, offset: u64, len: u64) -> DbResult<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut data = Vec::new();
        file.take(len).read_to_end(&mut data)?;
        Ok(data)
    }

    pub fn read_all(&self) -> DbResult<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    /// Writes `data` at byte `offset` and syncs it to disk.
    ///
    /// With `truncate`, the file is first cut at `offset` unless the write
    /// already lands exactly at its end, so nothing stale survives past the
    /// written data.
    pub fn write_at(&self, data: &[u8], offset: u64, truncate: bool) -> DbResult<()> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        if truncate && offset != (file.metadata()?.len() / RECORD) * RECORD {
            file.set_len(offset)?;
        }
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()?;
        trace!("wrote {} bytes at {} to {}", data.len(), offset, self.path.display());
        Ok(())
    }

    /// Creates (or empties) the file.
    pub fn create_empty(&self) -> DbResult<()> {
        File::create(&self.path)?;
        Ok(())
    }

    /// Grows the file to at least `len` bytes. Never shrinks it.
    pub fn ensure_len_sparse(&self, len: u64) -> DbResult<()> {
        let file = OpenOptions::new().write(true).create(true).truncate(false).open(&self.path)?;
        if file.metadata()?.len() < len {
            file.set_len(len)?;
        }
        Ok(())
    }

    pub fn rename_to<P: Into<PathBuf>>(&mut self, to: P) -> DbResult<()> {
        let to = to.into();
        if to != self.path {
            fs::rename(&self.path, &to)?;
            self.path = to;
        }
        Ok(())
    }

    pub fn remove(&self) -> DbResult<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
