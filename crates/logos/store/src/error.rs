use logos_journal::JournalError;
use logos_types::PropositionId;
use thiserror::Error;

/// Errors from Proposition Store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("proposition already exists: {0}")]
    DuplicateId(PropositionId),

    #[error("proposition not found: {0}")]
    NotFound(PropositionId),

    #[error("superseded proposition does not exist: {0}")]
    UnknownSuperseded(PropositionId),

    #[error("persistence failed: {0}")]
    Journal(#[from] JournalError),
}
