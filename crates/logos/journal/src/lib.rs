#![deny(unsafe_code)]
//! Durable append-only journal shared by the Proposition Store, the Rule Set
//! and the Proof Ledger.
//!
//! Frame layout: `length(u32 LE) | crc32(u32 LE) | json payload`.
//! A record is acknowledged only after its frame is written and, under
//! [`SyncMode::EveryWrite`], synced to stable storage.

pub mod backend;
pub mod error;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

pub use backend::{FileBackend, JournalBackend, MemoryBackend};
pub use error::JournalError;

/// Frame overhead: length(4) + crc32(4).
const FRAME_HEADER: usize = 8;
/// Upper bound on a single record; larger lengths are treated as corruption.
const MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

/// Durability policy for appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// fsync after every append (acknowledged records survive a crash).
    #[default]
    EveryWrite,
    /// Leave flushing to the OS.
    OsBuffered,
}

/// An append-only sequence of serialized records.
pub struct Journal {
    backend: Box<dyn JournalBackend>,
    sync: SyncMode,
    records: u64,
}

impl Journal {
    /// Open (or create) a file-backed journal.
    ///
    /// A torn final frame, left by a crash before acknowledgement, is
    /// truncated away. Corruption before the tail is an error.
    pub fn open_file(path: impl AsRef<Path>, sync: SyncMode) -> Result<Self, JournalError> {
        let mut backend = FileBackend::open(path.as_ref())?;
        let bytes = backend.read_all()?;
        let scan = scan_frames(&bytes)?;
        if scan.valid_len < bytes.len() {
            warn!(
                path = %path.as_ref().display(),
                valid_len = scan.valid_len,
                file_len = bytes.len(),
                "Truncating torn journal tail"
            );
            backend.truncate(scan.valid_len as u64)?;
        }
        info!(
            path = %path.as_ref().display(),
            records = scan.frames.len(),
            "Journal opened"
        );
        Ok(Self {
            backend: Box::new(backend),
            sync,
            records: scan.frames.len() as u64,
        })
    }

    /// Journal over a caller-supplied backend.
    pub fn with_backend(backend: Box<dyn JournalBackend>, sync: SyncMode) -> Result<Self, JournalError> {
        let bytes = backend.read_all()?;
        let scan = scan_frames(&bytes)?;
        Ok(Self {
            backend,
            sync,
            records: scan.frames.len() as u64,
        })
    }

    /// Volatile journal (tests, embedding).
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            sync: SyncMode::OsBuffered,
            records: 0,
        }
    }

    /// Append one record and return its zero-based position.
    pub fn append<T: Serialize>(&mut self, record: &T) -> Result<u64, JournalError> {
        let payload = serde_json::to_vec(record)?;
        if payload.len() > MAX_RECORD_BYTES {
            return Err(JournalError::RecordTooLarge(payload.len()));
        }

        let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);

        self.backend.write_all(&frame)?;
        match self.sync {
            SyncMode::EveryWrite => self.backend.sync()?,
            SyncMode::OsBuffered => self.backend.flush()?,
        }

        let position = self.records;
        self.records += 1;
        debug!(position, bytes = frame.len(), "Journal append");
        Ok(position)
    }

    /// Decode every record in append order.
    pub fn replay<T: DeserializeOwned>(&self) -> Result<Vec<T>, JournalError> {
        let bytes = self.backend.read_all()?;
        let scan = scan_frames(&bytes)?;
        scan.frames
            .into_iter()
            .map(|(offset, payload)| {
                serde_json::from_slice(payload).map_err(|e| JournalError::Corruption {
                    offset: offset as u64,
                    reason: format!("undecodable record: {e}"),
                })
            })
            .collect()
    }

    /// Number of acknowledged records.
    pub fn len(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

struct FrameScan<'a> {
    frames: Vec<(usize, &'a [u8])>,
    valid_len: usize,
}

/// Walk the frames in `bytes`, stopping at a torn tail.
fn scan_frames(bytes: &[u8]) -> Result<FrameScan<'_>, JournalError> {
    let mut frames = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        if bytes.len() - offset < FRAME_HEADER {
            break;
        }
        let len = u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]) as usize;
        let crc = u32::from_le_bytes([
            bytes[offset + 4],
            bytes[offset + 5],
            bytes[offset + 6],
            bytes[offset + 7],
        ]);

        if len > MAX_RECORD_BYTES {
            return Err(JournalError::Corruption {
                offset: offset as u64,
                reason: format!("frame length {len} exceeds limit"),
            });
        }

        let start = offset + FRAME_HEADER;
        let end = start + len;
        if end > bytes.len() {
            break;
        }

        let payload = &bytes[start..end];
        if crc32fast::hash(payload) != crc {
            if end == bytes.len() {
                // Last frame: written but never acknowledged.
                break;
            }
            return Err(JournalError::Corruption {
                offset: offset as u64,
                reason: "crc mismatch".into(),
            });
        }

        frames.push((offset, payload));
        offset = end;
    }

    Ok(FrameScan {
        frames,
        valid_len: offset,
    })
}
