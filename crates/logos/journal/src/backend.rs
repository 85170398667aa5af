use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::JournalError;

/// Byte-level storage behind a [`crate::Journal`].
pub trait JournalBackend: Send + Sync {
    fn write_all(&mut self, data: &[u8]) -> Result<(), JournalError>;
    fn flush(&mut self) -> Result<(), JournalError>;
    fn sync(&mut self) -> Result<(), JournalError>;
    fn read_all(&self) -> Result<Vec<u8>, JournalError>;
    fn truncate(&mut self, len: u64) -> Result<(), JournalError>;
}

// ---- File-backed storage ----

pub struct FileBackend {
    path: PathBuf,
    file: File,
}

impl FileBackend {
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl JournalBackend for FileBackend {
    fn write_all(&mut self, data: &[u8]) -> Result<(), JournalError> {
        self.file.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<u8>, JournalError> {
        let mut reader = File::open(&self.path)?;
        reader.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn truncate(&mut self, len: u64) -> Result<(), JournalError> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        Ok(())
    }
}

// ---- In-memory storage (for testing) ----

#[derive(Clone, Default)]
pub struct MemoryBackend {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend over a buffer the caller keeps a handle to.
    pub fn shared(buffer: Arc<Mutex<Vec<u8>>>) -> Self {
        Self { buffer }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl JournalBackend for MemoryBackend {
    fn write_all(&mut self, data: &[u8]) -> Result<(), JournalError> {
        self.lock().extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        Ok(())
    }

    fn sync(&mut self) -> Result<(), JournalError> {
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<u8>, JournalError> {
        Ok(self.lock().clone())
    }

    fn truncate(&mut self, len: u64) -> Result<(), JournalError> {
        self.lock().truncate(len as usize);
        Ok(())
    }
}
