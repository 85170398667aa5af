use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use logos_engine::Verdict;
use logos_types::{Clock, ContentHash, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::LedgerError;
use crate::record::{genesis_hash, ProofRecord, RecordDraft, RecordKind};
use crate::storage::{LedgerStorage, MemoryLedgerStorage};

/// Result of walking a range of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub from: u64,
    pub to: u64,
    pub intact: bool,
    /// Records that passed every check.
    pub checked: u64,
    pub offending_index: Option<u64>,
    pub reason: Option<String>,
}

impl ChainReport {
    fn intact(from: u64, to: u64) -> Self {
        Self {
            from,
            to,
            intact: true,
            checked: to - from,
            offending_index: None,
            reason: None,
        }
    }

    fn broken(from: u64, to: u64, index: u64, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            intact: false,
            checked: index - from,
            offending_index: Some(index),
            reason: Some(reason.into()),
        }
    }
}

/// Append-only, hash-linked record of every decision and privileged
/// operation.
///
/// The ledger is not internally synchronized. The Command Gate owns it
/// inside its commit critical section, which orders appends.
pub struct ProofLedger {
    storage: Box<dyn LedgerStorage>,
    clock: Arc<dyn Clock>,
    seal_key: Option<SigningKey>,
    /// Index of the newest record known to be sound.
    verified: Option<u64>,
    /// Set while the chain is broken; carries the failure reason.
    halted: Option<String>,
}

impl ProofLedger {
    /// Open a ledger over `storage`, verifying the whole chain.
    ///
    /// A broken chain does not fail the open. The ledger starts halted and
    /// refuses appends until [`ProofLedger::recover`] succeeds.
    pub fn open(storage: Box<dyn LedgerStorage>) -> Result<Self, LedgerError> {
        let mut ledger = Self {
            storage,
            clock: Arc::new(SystemClock),
            seal_key: None,
            verified: None,
            halted: None,
        };
        ledger.revalidate()?;
        Ok(ledger)
    }

    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryLedgerStorage::new()),
            clock: Arc::new(SystemClock),
            seal_key: None,
            verified: None,
            halted: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seal every new record with `key` and require valid seals during
    /// verification.
    pub fn with_seal_key(mut self, key: SigningKey) -> Result<Self, LedgerError> {
        self.seal_key = Some(key);
        self.revalidate()?;
        Ok(self)
    }

    pub fn seal_key(&self) -> Option<VerifyingKey> {
        self.seal_key.as_ref().map(SigningKey::verifying_key)
    }

    pub fn len(&self) -> u64 {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn last_verified_index(&self) -> Option<u64> {
        self.verified
    }

    /// Hash the next record will link to.
    pub fn head_hash(&self) -> Result<ContentHash, LedgerError> {
        match self.len() {
            0 => Ok(genesis_hash()),
            n => Ok(self.storage.read(n - 1)?.hash),
        }
    }

    pub fn get(&self, index: u64) -> Result<ProofRecord, LedgerError> {
        let len = self.len();
        if index >= len {
            return Err(LedgerError::InvalidRange {
                from: index,
                to: index + 1,
                len,
            });
        }
        self.storage.read(index)
    }

    /// Record a Command Gate verdict.
    pub fn append_verdict(&mut self, verdict: &Verdict) -> Result<ProofRecord, LedgerError> {
        self.append(RecordDraft::verdict(verdict))
    }

    /// Link, hash, seal and store one record.
    pub fn append(&mut self, draft: RecordDraft) -> Result<ProofRecord, LedgerError> {
        if let Some(reason) = &self.halted {
            return Err(LedgerError::ChainBroken {
                last_verified_index: self.verified,
                reason: reason.clone(),
            });
        }

        let index = self.len();
        let prev_hash = match index {
            0 => genesis_hash(),
            n => {
                let tail = match self.storage.read(n - 1) {
                    Ok(tail) => tail,
                    Err(e) => return Err(self.halt(format!("previous record unreadable: {e}"))),
                };
                if let Some(reason) = self.check_record(&tail, n - 1, None) {
                    self.verified = (n - 1).checked_sub(1);
                    return Err(self.halt(reason));
                }
                tail.hash
            }
        };

        let mut record = ProofRecord::from_draft(draft, index, prev_hash, self.clock.now())?;
        if let Some(key) = &self.seal_key {
            record.seal = Some(hex::encode(key.sign(record.hash.as_bytes()).to_bytes()));
        }

        if let Err(e) = self.storage.append(&record) {
            return Err(self.halt(format!("storage append failed: {e}")));
        }
        self.verified = Some(index);
        info!(
            index,
            kind = %record.kind,
            hash = %record.hash,
            subject = %record.subject,
            "Proof record appended"
        );
        Ok(record)
    }

    /// Verify records `[from, to)`.
    ///
    /// Each record must sit at its index, link to its predecessor's hash,
    /// hash to its stored hash and, when a seal key is configured, carry a
    /// valid seal. The first failing record is reported.
    pub fn verify_chain(&self, from: u64, to: u64) -> Result<ChainReport, LedgerError> {
        let len = self.len();
        if from > to || to > len {
            return Err(LedgerError::InvalidRange { from, to, len });
        }
        let mut expected_prev = if from == 0 {
            genesis_hash()
        } else {
            match self.storage.read(from - 1) {
                Ok(r) => r.hash,
                Err(e) => return Ok(ChainReport::broken(from, to, from, format!("predecessor unreadable: {e}"))),
            }
        };
        for index in from..to {
            let record = match self.storage.read(index) {
                Ok(r) => r,
                Err(e) => return Ok(ChainReport::broken(from, to, index, format!("record unreadable: {e}"))),
            };
            if let Some(reason) = self.check_record(&record, index, Some(&expected_prev)) {
                return Ok(ChainReport::broken(from, to, index, reason));
            }
            expected_prev = record.hash;
        }
        Ok(ChainReport::intact(from, to))
    }

    /// Records `[from, to)` with the chain report covering them.
    pub fn export(&self, from: u64, to: u64) -> Result<(Vec<ProofRecord>, ChainReport), LedgerError> {
        let report = self.verify_chain(from, to)?;
        let end = report.offending_index.unwrap_or(to);
        let records = (from..end)
            .map(|i| self.storage.read(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, report))
    }

    /// Re-verify the full chain and lift the halt if it is intact.
    pub fn recover(&mut self) -> Result<ChainReport, LedgerError> {
        let report = self.revalidate()?;
        if report.intact {
            info!(records = self.len(), "Proof ledger recovered");
            Ok(report)
        } else {
            Err(LedgerError::ChainBroken {
                last_verified_index: self.verified,
                reason: report.reason.unwrap_or_default(),
            })
        }
    }

    /// Count of records of `kind`.
    pub fn count(&self, kind: RecordKind) -> Result<usize, LedgerError> {
        let mut n = 0;
        for i in 0..self.len() {
            if self.storage.read(i)?.kind == kind {
                n += 1;
            }
        }
        Ok(n)
    }

    fn revalidate(&mut self) -> Result<ChainReport, LedgerError> {
        let report = self.verify_chain(0, self.len())?;
        match report.offending_index {
            None => {
                self.verified = self.len().checked_sub(1);
                self.halted = None;
            }
            Some(index) => {
                self.verified = index.checked_sub(1);
                let reason = report.reason.clone().unwrap_or_default();
                error!(index, reason = %reason, "Proof chain verification failed");
                self.halted = Some(reason);
            }
        }
        Ok(report)
    }

    fn check_record(&self, record: &ProofRecord, index: u64, expected_prev: Option<&ContentHash>) -> Option<String> {
        if record.index != index {
            return Some(format!("index mismatch: expected {index}, found {}", record.index));
        }
        if let Some(prev) = expected_prev {
            if record.prev_hash != *prev {
                return Some("previous hash link mismatch".into());
            }
        }
        match record.compute_hash() {
            Ok(hash) if hash == record.hash => {}
            Ok(_) => return Some("record hash mismatch".into()),
            Err(e) => return Some(format!("record not hashable: {e}")),
        }
        if let Some(key) = &self.seal_key {
            if let Err(reason) = verify_seal(&key.verifying_key(), record) {
                return Some(reason);
            }
        }
        None
    }

    /// Refuse further appends until [`recover`](Self::recover) succeeds.
    ///
    /// Used by callers that could not apply a change after its record was
    /// appended, so the ledger never runs ahead of state unnoticed.
    pub fn halt(&mut self, reason: impl Into<String>) -> LedgerError {
        let reason = reason.into();
        warn!(last_verified = ?self.verified, reason = %reason, "Proof ledger halted");
        self.halted = Some(reason.clone());
        LedgerError::ChainBroken {
            last_verified_index: self.verified,
            reason,
        }
    }
}

fn verify_seal(key: &VerifyingKey, record: &ProofRecord) -> Result<(), String> {
    let seal = record.seal.as_deref().ok_or("record is not sealed")?;
    let bytes: [u8; 64] = hex::decode(seal)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or("seal is not a 64-byte hex signature")?;
    key.verify(record.hash.as_bytes(), &Signature::from_bytes(&bytes))
        .map_err(|_| "seal signature mismatch".to_string())
}
