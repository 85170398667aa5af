use logos_rules::{ConstraintRule, EvalContext, RuleBody, RuleSnapshot, Vocabulary};
use logos_store::{PropositionFilter, PropositionStore};
use logos_types::{Candidate, OriginStatus, Polarity, PropositionId, RuleId};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::closure::{expand, Budget, Fact};
use crate::config::EngineConfig;
use crate::verdict::{
    push_unique, Counterexample, Decision, EvaluationBasis, InferenceStep, Premise, RefusalKind,
    Uncertainty, Verdict, Violation,
};

/// A consequence of a proposition under the active `IMPLIES` rules.
#[derive(Clone, Debug, PartialEq)]
pub struct Derivation {
    pub statement: String,
    pub polarity: Polarity,
    pub confidence: f64,
    pub depth: usize,
    pub rules: Vec<RuleId>,
}

/// Evaluates candidates against the Proposition Store and a Rule Set
/// snapshot. Evaluation never mutates either.
pub struct ContradictionEngine {
    vocabulary: Arc<Vocabulary>,
    config: EngineConfig,
}

impl ContradictionEngine {
    pub fn new(vocabulary: Arc<Vocabulary>, config: EngineConfig) -> Self {
        Self { vocabulary, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate a claim or command.
    ///
    /// Checks run in order: origin, direct contradiction, rule compliance,
    /// survival, then bounded chaining. Chaining only runs when the
    /// candidate itself is clean, so a refusal carries the shallowest
    /// failing premise set.
    pub fn evaluate(&self, candidate: &Candidate, rules: &RuleSnapshot, store: &PropositionStore) -> Verdict {
        let started = Instant::now();
        let budget = Budget::new(self.config.search_timeout());
        let basis = EvaluationBasis {
            rules_version: rules.version(),
            store_version: store.version(),
        };
        let propositions = candidate.propositions();
        let confidence = propositions
            .iter()
            .map(|p| p.confidence.value())
            .fold(1.0, f64::min);

        let mut steps = Vec::new();
        let mut violations = self.check_origins(candidate, &mut steps);
        if !violations.is_empty() {
            return self.refuse(candidate, violations, steps, confidence, basis, &[]);
        }

        let in_scope = rules.in_scope(candidate.domains());
        let implies: Vec<Arc<ConstraintRule>> = in_scope
            .iter()
            .filter(|r| matches!(r.body(), RuleBody::Implies { .. }))
            .cloned()
            .collect();

        let roots: Vec<Fact> = propositions
            .iter()
            .map(|p| Fact::root(Arc::new(p.clone())))
            .collect();
        let stored_roots = self.stored_facts(store, &roots);
        let consulted: Vec<Premise> = stored_roots.iter().map(|f| f.origin.clone()).collect();

        let stored = expand(stored_roots, &implies, self.config.max_depth, &budget);
        let derived = expand(roots, &implies, self.config.max_depth, &budget);
        steps.extend(stored.steps);

        let deepest = derived.facts.iter().map(|f| f.depth).max().unwrap_or(0);
        let mut reached = 0;
        for level in 0..=deepest {
            reached = level;
            for (i, fact) in derived.facts.iter().enumerate().filter(|(_, f)| f.depth == level) {
                self.check_conflicts(fact, &stored.facts, &in_scope, &mut violations);
                self.check_conflicts(fact, &derived.facts[..i], &in_scope, &mut violations);
                steps.push(InferenceStep {
                    name: "direct-check".into(),
                    rule: None,
                    inputs: vec![fact.describe()],
                    output: format!("checked against {} known facts", stored.facts.len() + i),
                    confidence: fact.confidence,
                    depth: level,
                });
                self.check_requirements(fact, candidate, &in_scope, &mut violations, &mut steps);
            }
            if level == 0 {
                self.check_survival(candidate, &in_scope, &mut violations, &mut steps);
            }
            if !violations.is_empty() {
                break;
            }
        }
        steps.extend(derived.steps.into_iter().filter(|s| s.depth <= reached));

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !violations.is_empty() {
            debug!(
                candidate = %candidate.label(),
                violations = violations.len(),
                depth = reached,
                elapsed_ms,
                "Candidate refused"
            );
            return self.refuse(candidate, violations, steps, confidence, basis, &in_scope);
        }

        let uncertainty = derived.uncertainty.or(stored.uncertainty);
        let mut premises: Vec<Premise> = propositions.iter().map(Premise::proposition).collect();
        for premise in consulted {
            push_unique(&mut premises, premise);
        }
        for rule in &in_scope {
            push_unique(&mut premises, Premise::rule(rule));
        }

        debug!(
            candidate = %candidate.label(),
            premises = premises.len(),
            uncertain = uncertainty.is_some(),
            elapsed_ms,
            "Candidate accepted"
        );
        Verdict {
            candidate: candidate.label(),
            decision: Decision::Accept,
            premises,
            steps,
            counterexample: None,
            uncertainty,
            confidence,
            basis,
        }
    }

    /// Every consequence of `proposition` within the depth bound.
    pub fn consequences(&self, proposition: &logos_types::Proposition, rules: &RuleSnapshot) -> (Vec<Derivation>, Option<Uncertainty>) {
        let implies: Vec<Arc<ConstraintRule>> = rules
            .in_scope([proposition.domain.as_str()])
            .into_iter()
            .filter(|r| matches!(r.body(), RuleBody::Implies { .. }))
            .collect();
        let budget = Budget::new(self.config.search_timeout());
        let out = expand(
            vec![Fact::root(Arc::new(proposition.clone()))],
            &implies,
            self.config.max_depth,
            &budget,
        );
        let derivations = out
            .facts
            .into_iter()
            .filter(|f| f.depth > 0)
            .map(|f| Derivation {
                statement: f.describe(),
                polarity: f.prop.polarity,
                confidence: f.confidence,
                depth: f.depth,
                rules: f.chain.iter().filter_map(Premise::rule_id).collect(),
            })
            .collect();
        (derivations, out.uncertainty)
    }

    fn check_origins(&self, candidate: &Candidate, steps: &mut Vec<InferenceStep>) -> Vec<Violation> {
        let mut violations = Vec::new();
        for p in candidate.propositions() {
            let problem = match p.verify_origin() {
                OriginStatus::Verified => {
                    steps.push(InferenceStep {
                        name: "origin".into(),
                        rule: None,
                        inputs: vec![p.origin.source.clone()],
                        output: format!("origin signature verified for {}", p.id),
                        confidence: p.confidence.value(),
                        depth: 0,
                    });
                    None
                }
                OriginStatus::Unsigned if self.config.require_signed_origin => {
                    Some(format!("{} carries no origin signature", p.id))
                }
                OriginStatus::Unsigned => None,
                OriginStatus::Invalid(reason) => Some(format!("origin of {} is invalid: {reason}", p.id)),
            };
            if let Some(reason) = problem {
                violations.push(Violation {
                    kind: RefusalKind::UnverifiedOrigin,
                    rule: None,
                    severity: self.config.direct_contradiction_weight,
                    reason,
                    premises: Vec::new(),
                    depth: 0,
                });
            }
        }
        violations
    }

    /// Active stored facts sharing a subject and domain with a candidate root.
    fn stored_facts(&self, store: &PropositionStore, roots: &[Fact]) -> Vec<Fact> {
        let own: BTreeSet<PropositionId> = roots
            .iter()
            .filter_map(|r| r.origin.proposition_id())
            .collect();
        let scopes: BTreeSet<(&str, &str)> = roots
            .iter()
            .map(|r| (r.prop.triple.subject.as_str(), r.prop.domain.as_str()))
            .collect();

        let mut facts = Vec::new();
        for (subject, domain) in scopes {
            let query = store.query(PropositionFilter::any().subject(subject).domain(domain));
            facts.extend(query.iter().filter(|p| !own.contains(&p.id)).map(Fact::root));
        }
        facts
    }

    /// Conflicts between candidate-side `fact` and each of `others`.
    fn check_conflicts(
        &self,
        fact: &Fact,
        others: &[Fact],
        in_scope: &[Arc<ConstraintRule>],
        violations: &mut Vec<Violation>,
    ) {
        let p = &fact.prop;
        for other in others {
            let q = &other.prop;
            if p.triple.subject != q.triple.subject || p.domain != q.domain {
                continue;
            }
            let derived = fact.depth > 0 || other.depth > 0;

            let negation = p.triple.predicate == q.triple.predicate
                && p.triple.object == q.triple.object
                && p.polarity != q.polarity;
            let antonym = p.polarity == Polarity::Affirmed
                && q.polarity == Polarity::Affirmed
                && p.triple.object == q.triple.object
                && self.vocabulary.are_antonyms(&p.triple.predicate, &q.triple.predicate);

            if negation || antonym {
                let how = if negation { "negates" } else { "opposes" };
                violations.push(Violation {
                    kind: if derived {
                        RefusalKind::IndirectContradiction
                    } else {
                        RefusalKind::DirectContradiction
                    },
                    rule: None,
                    severity: self.config.direct_contradiction_weight,
                    reason: format!("'{}' {how} '{}'", fact.describe(), other.describe()),
                    premises: conflict_premises(fact, other, None),
                    depth: fact.depth.max(other.depth),
                });
            }

            for rule in in_scope {
                let RuleBody::Exclusive { predicate, objects } = rule.body() else {
                    continue;
                };
                let exclusive = rule.definition.applies_to(&p.domain)
                    && p.polarity == Polarity::Affirmed
                    && q.polarity == Polarity::Affirmed
                    && &p.triple.predicate == predicate
                    && &q.triple.predicate == predicate
                    && p.triple.object != q.triple.object
                    && objects.contains(&p.triple.object)
                    && objects.contains(&q.triple.object);
                if exclusive {
                    violations.push(Violation {
                        kind: if derived {
                            RefusalKind::IndirectContradiction
                        } else {
                            RefusalKind::RuleViolation
                        },
                        rule: Some(rule.id),
                        severity: rule.priority(),
                        reason: format!(
                            "'{}' and '{}' violate \"{}\"",
                            fact.describe(),
                            other.describe(),
                            rule.name()
                        ),
                        premises: conflict_premises(fact, other, Some(rule)),
                        depth: fact.depth.max(other.depth),
                    });
                }
            }
        }
    }

    fn check_requirements(
        &self,
        fact: &Fact,
        candidate: &Candidate,
        in_scope: &[Arc<ConstraintRule>],
        violations: &mut Vec<Violation>,
        steps: &mut Vec<InferenceStep>,
    ) {
        let ctx = EvalContext::new(&fact.prop)
            .with_confidence(fact.confidence)
            .with_command(candidate.intent().map(|i| i.as_str()), candidate.effect());

        for rule in in_scope {
            let RuleBody::Require(expr) = rule.body() else {
                continue;
            };
            if !rule.definition.applies_to(&fact.prop.domain) {
                continue;
            }
            let outcome = expr.evaluate(&ctx);
            steps.push(InferenceStep {
                name: "require".into(),
                rule: Some(rule.id),
                inputs: vec![fact.describe()],
                output: match outcome {
                    Some(true) => "satisfied".into(),
                    Some(false) => format!("violated: {expr}"),
                    None => "not applicable".into(),
                },
                confidence: fact.confidence,
                depth: fact.depth,
            });
            if outcome == Some(false) {
                let mut premises = vec![Premise::rule(rule)];
                for p in &fact.chain {
                    push_unique(&mut premises, p.clone());
                }
                violations.push(Violation {
                    kind: if fact.depth > 0 {
                        RefusalKind::IndirectContradiction
                    } else {
                        RefusalKind::RuleViolation
                    },
                    rule: Some(rule.id),
                    severity: rule.priority(),
                    reason: format!("'{}' fails \"{}\": {expr}", fact.describe(), rule.name()),
                    premises,
                    depth: fact.depth,
                });
            }
        }
    }

    fn check_survival(
        &self,
        candidate: &Candidate,
        in_scope: &[Arc<ConstraintRule>],
        violations: &mut Vec<Violation>,
        steps: &mut Vec<InferenceStep>,
    ) {
        let Candidate::Command(command) = candidate else {
            return;
        };
        for rule in in_scope {
            let RuleBody::Survival { intent, max_ratio } = rule.body() else {
                continue;
            };
            if !rule.definition.applies_to(&command.domain) || command.intent.as_str() != intent.as_str() {
                continue;
            }
            let failure = match &command.effect {
                None => Some(format!("intent '{intent}' declares no effect")),
                Some(effect) => {
                    let ratio = effect.extraction_ratio();
                    steps.push(InferenceStep {
                        name: "survival".into(),
                        rule: Some(rule.id),
                        inputs: vec![format!(
                            "magnitude {} / benefit {}",
                            effect.magnitude, effect.systemic_benefit
                        )],
                        output: format!("extraction ratio {ratio:.2} (limit {max_ratio})"),
                        confidence: 1.0,
                        depth: 0,
                    });
                    (ratio > *max_ratio).then(|| {
                        format!("extraction ratio {ratio:.2} exceeds the limit of {max_ratio} under \"{}\"", rule.name())
                    })
                }
            };
            if let Some(reason) = failure {
                violations.push(Violation {
                    kind: RefusalKind::SurvivalViolation,
                    rule: Some(rule.id),
                    severity: rule.priority(),
                    reason,
                    premises: vec![Premise::rule(rule)],
                    depth: 0,
                });
            }
        }
    }

    fn refuse(
        &self,
        candidate: &Candidate,
        mut violations: Vec<Violation>,
        steps: Vec<InferenceStep>,
        confidence: f64,
        basis: EvaluationBasis,
        in_scope: &[Arc<ConstraintRule>],
    ) -> Verdict {
        // in_scope is ranked by priority then recency, so its index breaks ties.
        let rank = |v: &Violation| {
            v.rule
                .and_then(|id| in_scope.iter().position(|r| r.id == id))
                .unwrap_or(usize::MAX)
        };
        violations.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| rank(a).cmp(&rank(b)))
                .then_with(|| a.depth.cmp(&b.depth))
        });
        let primary = violations.remove(0);
        let counterexample = Counterexample::new(primary, violations);

        Verdict {
            candidate: candidate.label(),
            decision: Decision::Refuse,
            premises: counterexample.premises.clone(),
            steps,
            counterexample: Some(counterexample),
            uncertainty: None,
            confidence,
            basis,
        }
    }
}

/// The other side's origin and derivation, this side's derivation, and the
/// violated rule.
fn conflict_premises(fact: &Fact, other: &Fact, rule: Option<&Arc<ConstraintRule>>) -> Vec<Premise> {
    let mut premises = Vec::new();
    if other.origin != fact.origin {
        premises.push(other.origin.clone());
    }
    for p in other.chain.iter().chain(fact.chain.iter()) {
        push_unique(&mut premises, p.clone());
    }
    if let Some(rule) = rule {
        push_unique(&mut premises, Premise::rule(rule));
    }
    premises
}
