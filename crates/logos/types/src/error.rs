use thiserror::Error;

/// Errors raised while constructing model values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("confidence {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    #[error("confidence must be accompanied by a rationale")]
    MissingRationale,

    #[error("{0} must not be empty")]
    EmptyTerm(&'static str),

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("invalid ed25519 key material")]
    InvalidKey,

    #[error("signature does not verify")]
    SignatureMismatch,

    #[error("declared effect values must be finite and non-negative")]
    InvalidEffect,

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TypeError {
    fn from(e: serde_json::Error) -> Self {
        TypeError::Serialization(e.to_string())
    }
}

/// Errors from Policy Council quorum verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuorumError {
    #[error("invalid council: quorum {quorum} with {members} members")]
    InvalidCouncil { quorum: usize, members: usize },

    #[error("quorum not reached: {valid} valid approvals, {required} required")]
    Insufficient { valid: usize, required: usize },

    #[error("invalid council member key: {0}")]
    InvalidMemberKey(String),
}
