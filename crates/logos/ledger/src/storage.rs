//! Backing stores for the Proof Ledger.

use logos_journal::Journal;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::LedgerError;
use crate::record::ProofRecord;

/// Append-only record storage.
///
/// Implementations store records as given. Integrity is the ledger's job,
/// so a storage may hand back records that no longer hash correctly.
pub trait LedgerStorage: Send {
    fn append(&mut self, record: &ProofRecord) -> Result<(), LedgerError>;

    fn read(&self, index: u64) -> Result<ProofRecord, LedgerError>;

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory storage. The record vector may be shared with the caller.
#[derive(Clone, Default)]
pub struct MemoryLedgerStorage {
    records: Arc<Mutex<Vec<ProofRecord>>>,
}

impl MemoryLedgerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage over an externally held record vector.
    pub fn shared(records: Arc<Mutex<Vec<ProofRecord>>>) -> Self {
        Self { records }
    }
}

impl LedgerStorage for MemoryLedgerStorage {
    fn append(&mut self, record: &ProofRecord) -> Result<(), LedgerError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn read(&self, index: u64) -> Result<ProofRecord, LedgerError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        usize::try_from(index)
            .ok()
            .and_then(|i| records.get(i))
            .cloned()
            .ok_or_else(|| LedgerError::Storage(format!("record {index} not present")))
    }

    fn len(&self) -> u64 {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len() as u64
    }
}

/// Journal-backed storage with an in-memory read cache.
pub struct JournalLedgerStorage {
    journal: Journal,
    cache: Vec<ProofRecord>,
}

impl JournalLedgerStorage {
    /// Replay every record the journal holds.
    pub fn open(journal: Journal) -> Result<Self, LedgerError> {
        let cache: Vec<ProofRecord> = journal.replay()?;
        info!(records = cache.len(), "Proof ledger journal replayed");
        Ok(Self { journal, cache })
    }
}

impl LedgerStorage for JournalLedgerStorage {
    fn append(&mut self, record: &ProofRecord) -> Result<(), LedgerError> {
        self.journal.append(record)?;
        self.cache.push(record.clone());
        Ok(())
    }

    fn read(&self, index: u64) -> Result<ProofRecord, LedgerError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.cache.get(i))
            .cloned()
            .ok_or_else(|| LedgerError::Storage(format!("record {index} not present")))
    }

    fn len(&self) -> u64 {
        self.cache.len() as u64
    }
}
