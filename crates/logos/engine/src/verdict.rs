//! Verdicts, success proofs and counterexamples.

use logos_types::{Proposition, PropositionId, RuleId};
use logos_rules::ConstraintRule;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Refuse,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accept => f.write_str("accept"),
            Decision::Refuse => f.write_str("refuse"),
        }
    }
}

/// A proposition or rule a verdict depends on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Premise {
    Proposition {
        id: PropositionId,
        statement: String,
        source: String,
    },
    Rule {
        id: RuleId,
        name: String,
        priority: u32,
    },
}

impl Premise {
    pub fn proposition(p: &Proposition) -> Self {
        Premise::Proposition {
            id: p.id,
            statement: p.describe(),
            source: p.origin.source.clone(),
        }
    }

    pub fn rule(r: &ConstraintRule) -> Self {
        Premise::Rule {
            id: r.id,
            name: r.name().to_string(),
            priority: r.priority(),
        }
    }

    pub fn proposition_id(&self) -> Option<PropositionId> {
        match self {
            Premise::Proposition { id, .. } => Some(*id),
            Premise::Rule { .. } => None,
        }
    }

    pub fn rule_id(&self) -> Option<RuleId> {
        match self {
            Premise::Rule { id, .. } => Some(*id),
            Premise::Proposition { .. } => None,
        }
    }
}

impl fmt::Display for Premise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Premise::Proposition {
                statement, source, ..
            } => write!(f, "[{source}] {statement}"),
            Premise::Rule { name, priority, .. } => write!(f, "[rule p{priority}] {name}"),
        }
    }
}

/// Push `premise` unless already present. Keeps first-seen order.
pub(crate) fn push_unique(premises: &mut Vec<Premise>, premise: Premise) {
    if !premises.contains(&premise) {
        premises.push(premise);
    }
}

/// One named rule application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InferenceStep {
    /// `origin`, `direct-check`, `exclusive`, `require`, `survival` or `modus-ponens`.
    pub name: String,
    pub rule: Option<RuleId>,
    pub inputs: Vec<String>,
    pub output: String,
    pub confidence: f64,
    pub depth: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusalKind {
    DirectContradiction,
    RuleViolation,
    SurvivalViolation,
    IndirectContradiction,
    UnverifiedOrigin,
    Suspended,
}

impl fmt::Display for RefusalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefusalKind::DirectContradiction => "direct contradiction",
            RefusalKind::RuleViolation => "rule violation",
            RefusalKind::SurvivalViolation => "survival violation",
            RefusalKind::IndirectContradiction => "indirect contradiction",
            RefusalKind::UnverifiedOrigin => "unverified origin",
            RefusalKind::Suspended => "suspended",
        };
        f.write_str(s)
    }
}

/// One reason a candidate fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: RefusalKind,
    pub rule: Option<RuleId>,
    pub severity: u32,
    pub reason: String,
    /// Minimal premises reproducing this violation, excluding the candidate.
    pub premises: Vec<Premise>,
    /// Chaining depth at which it was found (0 = the candidate itself).
    pub depth: usize,
}

/// Minimal failing premise set behind a refusal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Counterexample {
    pub kind: RefusalKind,
    pub primary: Violation,
    pub secondary: Vec<Violation>,
    pub premises: Vec<Premise>,
}

impl Counterexample {
    pub fn new(primary: Violation, secondary: Vec<Violation>) -> Self {
        Self {
            kind: primary.kind,
            premises: primary.premises.clone(),
            primary,
            secondary,
        }
    }

    /// Human-readable refusal.
    pub fn render(&self) -> String {
        let mut out = format!("REFUSED: {}\n", self.kind);
        out.push_str(&format!("Reason: {}\n", self.primary.reason));
        out.push_str(&format!("Severity: {}\n", self.primary.severity));
        if !self.premises.is_empty() {
            out.push_str("\nCounterexample:\n");
            for (i, premise) in self.premises.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", i + 1, premise));
            }
        }
        if !self.secondary.is_empty() {
            out.push_str("\nAlso violated:\n");
            for v in &self.secondary {
                out.push_str(&format!("  - {} (severity {}): {}\n", v.kind, v.severity, v.reason));
            }
        }
        out.push_str("\nThe candidate is inconsistent with the premises above.");
        out
    }
}

/// Why an Accept is not a full proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Uncertainty {
    /// Chaining stopped at `depth` with consequences left unexplored.
    DepthExhausted { depth: usize },
    /// The search budget ran out.
    Timeout { elapsed_ms: u64 },
}

impl fmt::Display for Uncertainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uncertainty::DepthExhausted { depth } => write!(f, "depth bound {depth} exhausted"),
            Uncertainty::Timeout { elapsed_ms } => write!(f, "search timed out after {elapsed_ms} ms"),
        }
    }
}

/// Versions of the store and rule set a verdict was computed against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationBasis {
    pub rules_version: u64,
    pub store_version: u64,
}

/// Outcome of evaluating one candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub candidate: String,
    pub decision: Decision,
    pub premises: Vec<Premise>,
    pub steps: Vec<InferenceStep>,
    pub counterexample: Option<Counterexample>,
    pub uncertainty: Option<Uncertainty>,
    /// Weakest-link confidence of the candidate's propositions.
    pub confidence: f64,
    pub basis: EvaluationBasis,
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        self.decision == Decision::Accept
    }

    /// Accepted with no violated rule and no uncertainty.
    pub fn is_strict_accept(&self) -> bool {
        self.is_accept() && self.uncertainty.is_none() && self.counterexample.is_none()
    }

    /// Severity fed to the Override Controller. Zero unless refused on
    /// a violation.
    pub fn severity(&self) -> u32 {
        match (&self.decision, &self.counterexample) {
            (Decision::Refuse, Some(cx)) => cx.primary.severity,
            _ => 0,
        }
    }

    pub fn render(&self) -> String {
        match &self.counterexample {
            Some(cx) => cx.render(),
            None => match &self.uncertainty {
                Some(u) => format!("ACCEPTED with uncertainty: {u}"),
                None => format!("ACCEPTED on {} premises", self.premises.len()),
            },
        }
    }

    /// Convert into the refusal issued while the kernel is suspended.
    ///
    /// A refusal is returned unchanged so its counterexample still names the
    /// violated rule. An accept becomes a `Suspended` refusal citing the
    /// premises it was accepted on; any recorded violation moves to the
    /// secondary list.
    pub fn refuse_suspended(mut self) -> Self {
        if self.decision == Decision::Refuse {
            return self;
        }
        let why = match &self.uncertainty {
            Some(u) => format!("accepted only with uncertainty ({u})"),
            None => "not strictly compliant".to_string(),
        };
        let mut secondary = Vec::new();
        if let Some(previous) = self.counterexample.take() {
            secondary.push(previous.primary);
            secondary.extend(previous.secondary);
        }
        let primary = Violation {
            kind: RefusalKind::Suspended,
            rule: None,
            severity: 0,
            reason: format!("kernel is suspended and the candidate was {why}"),
            premises: self.premises.clone(),
            depth: 0,
        };
        self.decision = Decision::Refuse;
        self.counterexample = Some(Counterexample::new(primary, secondary));
        self
    }
}
