use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::OverrideError;

/// How accumulated severity fades over time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeverityDecay {
    /// Sum of refusal severities recorded within the last `window_secs`.
    SlidingWindow { window_secs: u64 },
    /// Running total halved every `half_life_secs`.
    Exponential { half_life_secs: u64 },
}

impl Default for SeverityDecay {
    fn default() -> Self {
        SeverityDecay::SlidingWindow { window_secs: 300 }
    }
}

/// Override Controller configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Decayed severity above which the controller suspends.
    pub threshold: f64,
    pub decay: SeverityDecay,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            threshold: 8.0,
            decay: SeverityDecay::default(),
        }
    }
}

impl OverrideConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_sliding_window(mut self, window: Duration) -> Self {
        self.decay = SeverityDecay::SlidingWindow {
            window_secs: window.as_secs(),
        };
        self
    }

    pub fn with_half_life(mut self, half_life: Duration) -> Self {
        self.decay = SeverityDecay::Exponential {
            half_life_secs: half_life.as_secs(),
        };
        self
    }

    pub fn validate(&self) -> Result<(), OverrideError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(OverrideError::InvalidConfig(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        match self.decay {
            SeverityDecay::SlidingWindow { window_secs: 0 } => {
                Err(OverrideError::InvalidConfig("sliding window must be at least one second".into()))
            }
            SeverityDecay::Exponential { half_life_secs: 0 } => {
                Err(OverrideError::InvalidConfig("half-life must be at least one second".into()))
            }
            _ => Ok(()),
        }
    }
}
