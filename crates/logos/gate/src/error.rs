use logos_journal::JournalError;
use logos_ledger::LedgerError;
use logos_override::OverrideError;
use logos_rules::{CompileError, RuleSetError};
use logos_store::StoreError;
use logos_types::{QuorumError, TypeError};
use thiserror::Error;

fn describe_index(index: &Option<u64>) -> String {
    index.map_or_else(|| "none".to_string(), |i| i.to_string())
}

/// Errors from the Command Gate.
///
/// A refused candidate is not an error; it comes back as a `Verdict`.
#[derive(Error, Debug)]
pub enum GateError {
    /// The proof chain is broken. The kernel refuses all work until the
    /// ledger is recovered.
    #[error("kernel halted: proof chain broken after index {}", describe_index(.last_verified_index))]
    Halted { last_verified_index: Option<u64> },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("policy council: {0}")]
    Council(#[from] QuorumError),

    #[error("rule compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("rule set: {0}")]
    RuleSet(#[from] RuleSetError),

    #[error("proposition store: {0}")]
    Store(#[from] StoreError),

    #[error("override controller: {0}")]
    Override(#[from] OverrideError),

    #[error("proof ledger: {0}")]
    Ledger(LedgerError),

    #[error("journal: {0}")]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl From<LedgerError> for GateError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ChainBroken {
                last_verified_index, ..
            } => GateError::Halted { last_verified_index },
            other => GateError::Ledger(other),
        }
    }
}
