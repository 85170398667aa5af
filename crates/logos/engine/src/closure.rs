//! Bounded modus-ponens closure.

use logos_rules::{ConstraintRule, RuleBody};
use logos_types::{Polarity, Proposition};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::verdict::{InferenceStep, Premise, Uncertainty};

/// Wall-clock budget shared by every expansion of one evaluation.
pub(crate) struct Budget {
    started: Instant,
    timeout: Option<Duration>,
}

impl Budget {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            timeout,
        }
    }

    fn exceeded(&self) -> bool {
        self.timeout.is_some_and(|t| self.started.elapsed() >= t)
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

type FactKey = (String, String, String, Polarity);

/// A proposition known or derived during one evaluation.
#[derive(Clone, Debug)]
pub(crate) struct Fact {
    pub(crate) prop: Arc<Proposition>,
    /// Weakest-link confidence along the derivation.
    pub(crate) confidence: f64,
    pub(crate) depth: usize,
    /// The stored or candidate proposition this fact derives from.
    pub(crate) origin: Premise,
    /// Rules applied, in order, to reach this fact from its origin.
    pub(crate) chain: Vec<Premise>,
}

impl Fact {
    pub(crate) fn root(prop: Arc<Proposition>) -> Self {
        Self {
            confidence: prop.confidence.value(),
            depth: 0,
            origin: Premise::proposition(&prop),
            chain: Vec::new(),
            prop,
        }
    }

    fn key(&self) -> FactKey {
        let t = &self.prop.triple;
        (
            t.subject.clone(),
            t.predicate.clone(),
            t.object.clone(),
            self.prop.polarity,
        )
    }

    /// Apply an `IMPLIES` rule to this fact, if its antecedent matches.
    fn apply(&self, rule: &ConstraintRule) -> Option<Fact> {
        let RuleBody::Implies {
            antecedent,
            consequent,
            confidence,
        } = rule.body()
        else {
            return None;
        };
        if !rule.definition.applies_to(&self.prop.domain) || !antecedent.matches(&self.prop) {
            return None;
        }

        let mut derived = (*self.prop).clone();
        derived.triple = consequent.instantiate(&self.prop.triple.subject);
        derived.polarity = consequent.polarity;

        let mut chain = self.chain.clone();
        chain.push(Premise::rule(rule));
        Some(Fact {
            prop: Arc::new(derived),
            confidence: self.confidence.min(confidence.unwrap_or(1.0)),
            depth: self.depth + 1,
            origin: self.origin.clone(),
            chain,
        })
    }

    pub(crate) fn describe(&self) -> String {
        self.prop.describe()
    }
}

/// Roots plus everything derivable from them within the depth bound.
pub(crate) struct Expansion {
    /// Ordered by depth, roots first.
    pub(crate) facts: Vec<Fact>,
    pub(crate) steps: Vec<InferenceStep>,
    pub(crate) uncertainty: Option<Uncertainty>,
}

pub(crate) fn expand(
    roots: Vec<Fact>,
    implies: &[Arc<ConstraintRule>],
    max_depth: usize,
    budget: &Budget,
) -> Expansion {
    let mut seen: HashSet<FactKey> = roots.iter().map(Fact::key).collect();
    let mut facts = roots.clone();
    let mut steps = Vec::new();
    let mut frontier = roots;

    for _ in 0..max_depth {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for fact in &frontier {
            for rule in implies {
                let Some(derived) = fact.apply(rule) else {
                    continue;
                };
                if budget.exceeded() {
                    facts.extend(next);
                    return Expansion {
                        facts,
                        steps,
                        uncertainty: Some(Uncertainty::Timeout {
                            elapsed_ms: budget.elapsed_ms(),
                        }),
                    };
                }
                if seen.insert(derived.key()) {
                    steps.push(InferenceStep {
                        name: "modus-ponens".into(),
                        rule: Some(rule.id),
                        inputs: vec![fact.describe()],
                        output: derived.describe(),
                        confidence: derived.confidence,
                        depth: derived.depth,
                    });
                    next.push(derived);
                }
            }
        }
        facts.extend(next.iter().cloned());
        frontier = next;
    }

    // Anything still derivable past the bound makes the result uncertain.
    let unexplored = frontier.iter().any(|fact| {
        implies
            .iter()
            .filter_map(|rule| fact.apply(rule))
            .any(|d| !seen.contains(&d.key()))
    });

    Expansion {
        facts,
        steps,
        uncertainty: unexplored.then_some(Uncertainty::DepthExhausted { depth: max_depth }),
    }
}
