use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Contradiction Engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum modus-ponens chaining depth (default: 3)
    pub max_depth: usize,
    /// Wall-clock budget for the bounded search, in milliseconds (default: none)
    pub search_timeout_ms: Option<u64>,
    /// Severity of a contradiction that involves no rule (default: 10)
    pub direct_contradiction_weight: u32,
    /// Refuse candidates without an origin signature (default: false)
    pub require_signed_origin: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            search_timeout_ms: None,
            direct_contradiction_weight: 10,
            require_signed_origin: false,
        }
    }
}

impl EngineConfig {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_direct_contradiction_weight(mut self, weight: u32) -> Self {
        self.direct_contradiction_weight = weight;
        self
    }

    pub fn with_signed_origin_required(mut self, required: bool) -> Self {
        self.require_signed_origin = required;
        self
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_ms.map(Duration::from_millis)
    }
}
