#![deny(unsafe_code)]
//! # logos-ledger
//!
//! The Proof Ledger: an append-only chain of [`ProofRecord`]s. Every record
//! carries the hash of its predecessor, a BLAKE3 hash over its own contents
//! and an optional ed25519 seal from the kernel key.
//!
//! A record that cannot be linked or re-hashed halts the ledger
//! ([`LedgerError::ChainBroken`]). Nothing is appended again until
//! [`ProofLedger::recover`] verifies the full chain.

pub mod error;
pub mod ledger;
pub mod record;
pub mod storage;

pub use error::LedgerError;
pub use ledger::{ChainReport, ProofLedger};
pub use record::{genesis_hash, ProofRecord, ProofRecordId, RecordDraft, RecordKind};
pub use storage::{JournalLedgerStorage, LedgerStorage, MemoryLedgerStorage};
