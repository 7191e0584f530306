//! Where the save record lives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by a [`SaveStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A slot holding at most one serialized save record.
pub trait SaveStore {
    /// The stored record, or `None` if nothing has been saved yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored record.
    fn write(&mut self, record: &str) -> Result<(), StorageError>;

    /// Remove the stored record. Clearing an empty store succeeds.
    fn clear(&mut self) -> Result<(), StorageError>;
}

impl<S: SaveStore + ?Sized> SaveStore for Box<S> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&mut self, record: &str) -> Result<(), StorageError> {
        (**self).write(record)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Keeps the record in memory. Lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `record`.
    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Some(record.into()),
        }
    }

    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.record.clone())
    }

    fn write(&mut self, record: &str) -> Result<(), StorageError> {
        self.record = Some(record.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.record = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Keeps the record in a single file. Writes go to a sibling temporary file
/// that is then renamed over the target, so a crash mid-write leaves the
/// previous record intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/evolution_clicker_save.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", crate::SAVE_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SaveStore for FileStore {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&mut self, record: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, record).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
