use chrono::{DateTime, Utc};
use logos_override::OverrideMode;
use logos_types::ContentHash;
use serde::{Deserialize, Serialize};

/// Snapshot of the kernel for operators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KernelStatus {
    pub mode: OverrideMode,
    pub severity: f64,
    pub threshold: f64,
    pub last_transition: Option<DateTime<Utc>>,
    pub ledger_len: u64,
    pub head_hash: Option<ContentHash>,
    pub halted: bool,
    pub last_verified_index: Option<u64>,
    pub rules_version: u64,
    pub active_rules: usize,
    pub propositions: usize,
}

impl KernelStatus {
    pub fn is_operational(&self) -> bool {
        !self.halted
    }
}
