use logos_types::QuorumError;

use crate::state::OverrideMode;
use thiserror::Error;

/// Errors from Override Controller operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverrideError {
    #[error("reset refused: {0}")]
    Unauthorized(#[from] QuorumError),

    #[error("reset refused: controller is not suspended")]
    NotSuspended,

    #[error("reset refused: a reason is required")]
    MissingReason,

    #[error("transition expected mode {expected} but controller is {actual}")]
    Stale {
        expected: OverrideMode,
        actual: OverrideMode,
    },

    #[error("invalid override configuration: {0}")]
    InvalidConfig(String),
}
