use chrono::{DateTime, Utc};
use logos_engine::Verdict;
use logos_types::{Clock, ContentHash, PolicyCouncil, SystemClock};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::config::{OverrideConfig, SeverityDecay};
use crate::error::OverrideError;
use crate::reset::{reset_message, ResetRequest};
use crate::state::{OverrideMode, OverrideStatus, Transition};

/// Decayed running total of refusal severities.
#[derive(Debug)]
enum SeverityCounter {
    Window {
        window: chrono::Duration,
        events: VecDeque<(DateTime<Utc>, f64)>,
    },
    Decaying {
        half_life_secs: f64,
        value: f64,
        at: DateTime<Utc>,
    },
}

impl SeverityCounter {
    fn new(decay: &SeverityDecay, now: DateTime<Utc>) -> Self {
        match *decay {
            SeverityDecay::SlidingWindow { window_secs } => SeverityCounter::Window {
                window: chrono::Duration::seconds(i64::try_from(window_secs).unwrap_or(i64::MAX)),
                events: VecDeque::new(),
            },
            SeverityDecay::Exponential { half_life_secs } => SeverityCounter::Decaying {
                half_life_secs: half_life_secs as f64,
                value: 0.0,
                at: now,
            },
        }
    }

    fn add(&mut self, amount: f64, now: DateTime<Utc>) {
        self.advance(now);
        match self {
            SeverityCounter::Window { events, .. } => events.push_back((now, amount)),
            SeverityCounter::Decaying { value, .. } => *value += amount,
        }
    }

    fn value(&mut self, now: DateTime<Utc>) -> f64 {
        self.advance(now);
        match self {
            SeverityCounter::Window { events, .. } => events.iter().map(|(_, s)| s).sum(),
            SeverityCounter::Decaying { value, .. } => *value,
        }
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        match self {
            SeverityCounter::Window { window, events } => {
                while events.front().is_some_and(|(at, _)| now - *at >= *window) {
                    events.pop_front();
                }
            }
            SeverityCounter::Decaying {
                half_life_secs,
                value,
                at,
            } => {
                let elapsed = (now - *at).num_milliseconds() as f64 / 1000.0;
                if elapsed > 0.0 {
                    *value *= 0.5f64.powf(elapsed / *half_life_secs);
                    *at = now;
                }
            }
        }
    }

    fn clear(&mut self, now: DateTime<Utc>) {
        match self {
            SeverityCounter::Window { events, .. } => events.clear(),
            SeverityCounter::Decaying { value, at, .. } => {
                *value = 0.0;
                *at = now;
            }
        }
    }
}

#[derive(Debug)]
struct ControllerState {
    mode: OverrideMode,
    counter: SeverityCounter,
    last_transition: Option<DateTime<Utc>>,
    refusals_recorded: u64,
}

/// The Normal / Suspended state machine.
///
/// Refusal severities accumulate in a decaying counter. When the counter
/// exceeds the threshold the controller suspends, and only a Policy
/// Council reset returns it to Normal. Decay alone never lifts a
/// suspension.
pub struct OverrideController {
    config: OverrideConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<ControllerState>,
}

impl OverrideController {
    pub fn new(config: OverrideConfig) -> Result<Self, OverrideError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: OverrideConfig, clock: Arc<dyn Clock>) -> Result<Self, OverrideError> {
        config.validate()?;
        let counter = SeverityCounter::new(&config.decay, clock.now());
        Ok(Self {
            config,
            clock,
            state: Mutex::new(ControllerState {
                mode: OverrideMode::Normal,
                counter,
                last_transition: None,
                refusals_recorded: 0,
            }),
        })
    }

    pub fn config(&self) -> &OverrideConfig {
        &self.config
    }

    pub fn mode(&self) -> OverrideMode {
        self.lock().mode
    }

    pub fn is_suspended(&self) -> bool {
        self.mode() == OverrideMode::Suspended
    }

    pub fn status(&self) -> OverrideStatus {
        let now = self.clock.now();
        let mut state = self.lock();
        OverrideStatus {
            mode: state.mode,
            severity: state.counter.value(now),
            threshold: self.config.threshold,
            last_transition: state.last_transition,
            refusals_recorded: state.refusals_recorded,
        }
    }

    /// Admissibility under the current mode. While suspended anything short
    /// of a strict accept becomes a refusal.
    pub fn filter(&self, verdict: Verdict) -> Verdict {
        if self.is_suspended() && !verdict.is_strict_accept() {
            debug!(candidate = %verdict.candidate, "Strict mode refusal");
            verdict.refuse_suspended()
        } else {
            verdict
        }
    }

    /// Add one refusal's severity. Returns the suspension this refusal calls
    /// for. The mode changes only when the transition is passed to
    /// [`OverrideController::commit`], after it has been recorded.
    pub fn record(&self, severity: u32) -> Option<Transition> {
        if severity == 0 {
            return None;
        }
        let now = self.clock.now();
        let mut state = self.lock();
        state.refusals_recorded += 1;
        state.counter.add(f64::from(severity), now);
        let total = state.counter.value(now);
        debug!(severity, total, threshold = self.config.threshold, "Refusal severity recorded");

        if state.mode == OverrideMode::Normal && total > self.config.threshold {
            return Some(Transition {
                from: OverrideMode::Normal,
                to: OverrideMode::Suspended,
                severity: total,
                threshold: self.config.threshold,
                at: now,
                cause: "contradiction severity exceeded threshold".into(),
            });
        }
        None
    }

    /// Check a reset request against the council and the current mode
    /// without changing anything. The returned transition is applied with
    /// [`OverrideController::commit`] once the reset has been recorded.
    pub fn authorize_reset(
        &self,
        request: &ResetRequest,
        council: &PolicyCouncil,
        ledger_head: &ContentHash,
    ) -> Result<Transition, OverrideError> {
        if request.reason.trim().is_empty() {
            return Err(OverrideError::MissingReason);
        }
        let certificate = council.verify_quorum(&reset_message(&request.reason, ledger_head), &request.approvals)?;

        let now = self.clock.now();
        let mut state = self.lock();
        if state.mode != OverrideMode::Suspended {
            return Err(OverrideError::NotSuspended);
        }
        debug!(signers = certificate.signers.len(), reason = %request.reason, "Override reset authorized");
        Ok(Transition {
            from: OverrideMode::Suspended,
            to: OverrideMode::Normal,
            severity: state.counter.value(now),
            threshold: self.config.threshold,
            at: now,
            cause: request.reason.clone(),
        })
    }

    /// Apply a recorded transition. Fails if the mode moved since the
    /// transition was issued.
    pub fn commit(&self, transition: &Transition) -> Result<(), OverrideError> {
        let mut state = self.lock();
        if state.mode != transition.from {
            return Err(OverrideError::Stale {
                expected: transition.from,
                actual: state.mode,
            });
        }
        state.mode = transition.to;
        state.last_transition = Some(transition.at);
        match transition.to {
            OverrideMode::Suspended => {
                warn!(
                    severity = transition.severity,
                    threshold = transition.threshold,
                    "Override engaged: kernel suspended"
                );
            }
            OverrideMode::Normal => {
                state.counter.clear(transition.at);
                info!(reason = %transition.cause, "Override reset: kernel back to normal");
            }
        }
        Ok(())
    }

    /// Restore a suspension found in the ledger on startup.
    pub fn resume_suspended(&self, since: DateTime<Utc>) {
        let mut state = self.lock();
        state.mode = OverrideMode::Suspended;
        state.last_transition = Some(since);
        info!(since = %since, "Override suspension restored from ledger");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
