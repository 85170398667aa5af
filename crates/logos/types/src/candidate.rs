use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::TypeError;
use crate::ids::CommandId;
use crate::proposition::{normalize_term, Proposition};

/// Declared purpose of a command (e.g. `extract`, `maintain`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntentTag(String);

impl IntentTag {
    pub fn new(tag: impl AsRef<str>) -> Result<Self, TypeError> {
        let tag = normalize_term(tag.as_ref());
        if tag.is_empty() {
            return Err(TypeError::EmptyTerm("intent"));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Net effect a command declares: what it takes versus what it returns to
/// the wider system over the long term.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclaredEffect {
    pub magnitude: f64,
    pub systemic_benefit: f64,
}

impl DeclaredEffect {
    pub fn new(magnitude: f64, systemic_benefit: f64) -> Result<Self, TypeError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(magnitude) || !valid(systemic_benefit) {
            return Err(TypeError::InvalidEffect);
        }
        Ok(Self {
            magnitude,
            systemic_benefit,
        })
    }

    /// Extraction-to-benefit ratio. Any extraction with zero declared
    /// benefit is unbounded.
    pub fn extraction_ratio(&self) -> f64 {
        if self.systemic_benefit <= 0.0 {
            if self.magnitude > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            self.magnitude / self.systemic_benefit
        }
    }
}

/// A proposed action: one or more propositions plus an intent tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub intent: IntentTag,
    pub domain: String,
    pub propositions: Vec<Proposition>,
    pub effect: Option<DeclaredEffect>,
}

impl Command {
    pub fn new(intent: IntentTag, domain: impl AsRef<str>) -> Self {
        Self {
            id: CommandId::new(),
            intent,
            domain: normalize_term(domain.as_ref()),
            propositions: Vec::new(),
            effect: None,
        }
    }

    pub fn with_proposition(mut self, proposition: Proposition) -> Self {
        self.propositions.push(proposition);
        self
    }

    pub fn with_effect(mut self, effect: DeclaredEffect) -> Self {
        self.effect = Some(effect);
        self
    }
}

/// What the kernel evaluates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Candidate {
    Claim(Proposition),
    Command(Command),
}

impl Candidate {
    /// Stable label used in logs and ledger records.
    pub fn label(&self) -> String {
        match self {
            Candidate::Claim(p) => p.id.to_string(),
            Candidate::Command(c) => c.id.to_string(),
        }
    }

    pub fn propositions(&self) -> &[Proposition] {
        match self {
            Candidate::Claim(p) => std::slice::from_ref(p),
            Candidate::Command(c) => &c.propositions,
        }
    }

    pub fn intent(&self) -> Option<&IntentTag> {
        match self {
            Candidate::Claim(_) => None,
            Candidate::Command(c) => Some(&c.intent),
        }
    }

    pub fn effect(&self) -> Option<&DeclaredEffect> {
        match self {
            Candidate::Claim(_) => None,
            Candidate::Command(c) => c.effect.as_ref(),
        }
    }

    /// Every domain the candidate touches.
    pub fn domains(&self) -> BTreeSet<&str> {
        let mut domains: BTreeSet<&str> =
            self.propositions().iter().map(|p| p.domain.as_str()).collect();
        if let Candidate::Command(c) = self {
            domains.insert(c.domain.as_str());
        }
        domains
    }
}

impl From<Proposition> for Candidate {
    fn from(p: Proposition) -> Self {
        Candidate::Claim(p)
    }
}

impl From<Command> for Candidate {
    fn from(c: Command) -> Self {
        Candidate::Command(c)
    }
}
