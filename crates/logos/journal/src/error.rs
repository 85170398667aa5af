use thiserror::Error;

/// Errors from journal operations.
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal corruption at offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    #[error("record of {0} bytes exceeds the frame limit")]
    RecordTooLarge(usize),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Serialization(e.to_string())
    }
}
