use logos_journal::JournalError;
use logos_types::TypeError;
use thiserror::Error;

fn describe_index(index: &Option<u64>) -> String {
    index.map_or_else(|| "none".to_string(), |i| i.to_string())
}

/// Errors from Proof Ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Fatal: the chain tail cannot be trusted. Every append fails until
    /// an operator runs `recover`.
    #[error("proof chain broken (last verified index: {}): {reason}", describe_index(.last_verified_index))]
    ChainBroken {
        last_verified_index: Option<u64>,
        reason: String,
    },

    #[error("invalid range [{from}, {to}) for a ledger of {len} records")]
    InvalidRange { from: u64, to: u64, len: u64 },

    #[error("ledger storage failure: {0}")]
    Storage(String),

    #[error("ledger journal failure: {0}")]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Type(#[from] TypeError),
}
