use logos_types::{Approval, ContentHash};
use serde::{Deserialize, Serialize};

const RESET_DOMAIN: &[u8] = b"logos-override-reset-v1:";

/// Message the council signs to return the kernel to Normal.
///
/// Binding the ledger head makes an approval valid for exactly one ledger
/// state, so it cannot be replayed after later records.
pub fn reset_message(reason: &str, ledger_head: &ContentHash) -> Vec<u8> {
    let mut msg = RESET_DOMAIN.to_vec();
    msg.extend_from_slice(reason.as_bytes());
    msg.extend_from_slice(ledger_head.as_bytes());
    ContentHash::hash(&msg).as_bytes().to_vec()
}

/// Policy Council request to leave Suspended mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRequest {
    pub reason: String,
    pub approvals: Vec<Approval>,
}

impl ResetRequest {
    pub fn new(reason: impl Into<String>, approvals: Vec<Approval>) -> Self {
        Self {
            reason: reason.into(),
            approvals,
        }
    }
}
