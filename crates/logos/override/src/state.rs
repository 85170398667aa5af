use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideMode {
    /// Ordinary policy applies.
    #[default]
    Normal,

    /// Only strictly compliant candidates are accepted.
    Suspended,
}

impl fmt::Display for OverrideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideMode::Normal => write!(f, "normal"),
            OverrideMode::Suspended => write!(f, "suspended"),
        }
    }
}

/// A mode change, as recorded in the Proof Ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: OverrideMode,
    pub to: OverrideMode,
    /// Decayed severity when the transition fired.
    pub severity: f64,
    pub threshold: f64,
    pub at: DateTime<Utc>,
    pub cause: String,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {} (severity {:.2}, threshold {:.2})",
            self.from, self.to, self.cause, self.severity, self.threshold
        )
    }
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideStatus {
    pub mode: OverrideMode,
    pub severity: f64,
    pub threshold: f64,
    pub last_transition: Option<DateTime<Utc>>,
    pub refusals_recorded: u64,
}
