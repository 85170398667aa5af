//! Compiled constraint rules.
//!
//! A [`ConstraintRule`] pairs an immutable [`RuleDefinition`] with its
//! [`Provenance`]. The [`RuleId`] is the digest of the definition alone, so
//! compiling the same text twice yields the same id.

use chrono::{DateTime, Utc};
use logos_types::{Approval, ContentHash, DeclaredEffect, Polarity, Proposition, RuleId, Triple};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::CompileError;

const RULE_DIGEST_DOMAIN: &[u8] = b"logos-rule-v1:";

/// Domain tag that applies a rule to every domain.
pub const ANY_DOMAIN: &str = "*";

/// Proposition and command fields a `REQUIRE` expression may read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Subject,
    Predicate,
    Object,
    Domain,
    Source,
    Intent,
    Confidence,
    Evidence,
    Magnitude,
    Benefit,
}

impl Field {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "subject" => Field::Subject,
            "predicate" => Field::Predicate,
            "object" => Field::Object,
            "domain" => Field::Domain,
            "source" => Field::Source,
            "intent" => Field::Intent,
            "confidence" => Field::Confidence,
            "evidence" => Field::Evidence,
            "magnitude" => Field::Magnitude,
            "benefit" => Field::Benefit,
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::Confidence | Field::Evidence | Field::Magnitude | Field::Benefit
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::Subject => "subject",
            Field::Predicate => "predicate",
            Field::Object => "object",
            Field::Domain => "domain",
            Field::Source => "source",
            Field::Intent => "intent",
            Field::Confidence => "confidence",
            Field::Evidence => "evidence",
            Field::Magnitude => "magnitude",
            Field::Benefit => "benefit",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Eq => ordering == Equal,
            CmpOp::Ne => ordering != Equal,
            CmpOp::Lt => ordering == Less,
            CmpOp::Le => ordering != Greater,
            CmpOp::Gt => ordering == Greater,
            CmpOp::Ge => ordering != Less,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Number(f64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(t) => write!(f, "{t}"),
        }
    }
}

/// Side-effect-free boolean expression over candidate fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Compare {
        field: Field,
        op: CmpOp,
        value: Literal,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Kleene three-valued evaluation. A comparison on a field the context
    /// does not carry (e.g. `magnitude` on a bare claim) is unknown.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Option<bool> {
        match self {
            Expr::Compare { field, op, value } => {
                let actual = ctx.field(*field)?;
                let ordering = match (actual, value) {
                    (Value::Number(a), Literal::Number(b)) => a.partial_cmp(b)?,
                    (Value::Text(a), Literal::Text(b)) => a.cmp(b.as_str()),
                    _ => return None,
                };
                Some(op.holds(ordering))
            }
            Expr::And(a, b) => match (a.evaluate(ctx), b.evaluate(ctx)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            Expr::Or(a, b) => match (a.evaluate(ctx), b.evaluate(ctx)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            Expr::Not(inner) => inner.evaluate(ctx).map(|v| !v),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { field, op, value } => write!(f, "{field} {op} {value}"),
            Expr::And(a, b) => write!(f, "({a} AND {b})"),
            Expr::Or(a, b) => write!(f, "({a} OR {b})"),
            Expr::Not(e) => write!(f, "NOT {e}"),
        }
    }
}

/// `[NOT] predicate object`, matched against any subject.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    pub predicate: String,
    pub object: String,
    pub polarity: Polarity,
}

impl Pattern {
    pub fn matches(&self, p: &Proposition) -> bool {
        p.polarity == self.polarity
            && p.triple.predicate == self.predicate
            && p.triple.object == self.object
    }

    /// Instantiate the pattern for `subject`.
    pub fn instantiate(&self, subject: &str) -> Triple {
        Triple {
            subject: subject.to_string(),
            predicate: self.predicate.clone(),
            object: self.object.clone(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.polarity == Polarity::Negated {
            f.write_str("NOT ")?;
        }
        write!(f, "{} {}", self.predicate, self.object)
    }
}

/// The four rule classes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleBody {
    /// A subject holds at most one of `objects` under `predicate`.
    Exclusive {
        predicate: String,
        objects: BTreeSet<String>,
    },
    /// Modus ponens: `X antecedent` yields `X consequent`.
    Implies {
        antecedent: Pattern,
        consequent: Pattern,
        confidence: Option<f64>,
    },
    /// Every candidate in scope must satisfy the expression.
    Require(Expr),
    /// Commands with `intent` may not extract more than `max_ratio` times
    /// their declared systemic benefit.
    Survival { intent: String, max_ratio: f64 },
}

impl RuleBody {
    pub fn class(&self) -> &'static str {
        match self {
            RuleBody::Exclusive { .. } => "exclusive",
            RuleBody::Implies { .. } => "implies",
            RuleBody::Require(_) => "require",
            RuleBody::Survival { .. } => "survival",
        }
    }
}

impl fmt::Display for RuleBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleBody::Exclusive { predicate, objects } => {
                let list: Vec<&str> = objects.iter().map(String::as_str).collect();
                write!(f, "EXCLUSIVE {predicate} {{ {} }}", list.join(" "))
            }
            RuleBody::Implies {
                antecedent,
                consequent,
                confidence,
            } => {
                write!(f, "IMPLIES {antecedent} -> {consequent}")?;
                if let Some(c) = confidence {
                    write!(f, " CONFIDENCE {c}")?;
                }
                Ok(())
            }
            RuleBody::Require(expr) => write!(f, "REQUIRE {expr}"),
            RuleBody::Survival { intent, max_ratio } => {
                write!(f, "SURVIVAL {intent} RATIO {max_ratio}")
            }
        }
    }
}

/// The formally evaluable, immutable part of a rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub domain: String,
    pub priority: u32,
    /// What must hold for the rule itself to be admitted or amended.
    pub obligation: Option<String>,
    pub body: RuleBody,
}

impl RuleDefinition {
    pub fn digest(&self) -> Result<RuleId, CompileError> {
        Ok(RuleId(ContentHash::digest_json(RULE_DIGEST_DOMAIN, self)?))
    }

    pub fn applies_to(&self, domain: &str) -> bool {
        self.domain == ANY_DOMAIN || self.domain == domain
    }
}

/// Who wrote a rule, when it was compiled, and who approved it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub author: String,
    pub compiled_at: DateTime<Utc>,
    pub approvals: Vec<Approval>,
    /// 1 for an original rule, incremented on each amendment.
    pub version: u32,
    pub supersedes: Option<RuleId>,
}

/// An admitted (or admissible) constraint rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRule {
    pub id: RuleId,
    pub definition: RuleDefinition,
    pub provenance: Provenance,
}

impl ConstraintRule {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn domain(&self) -> &str {
        &self.definition.domain
    }

    pub fn priority(&self) -> u32 {
        self.definition.priority
    }

    pub fn body(&self) -> &RuleBody {
        &self.definition.body
    }

    pub fn authored_by(mut self, author: impl Into<String>) -> Self {
        self.provenance.author = author.into();
        self
    }

    /// True when `id` is the digest of the definition.
    pub fn is_intact(&self) -> bool {
        self.definition.digest().is_ok_and(|id| id == self.id)
    }
}

impl fmt::Display for ConstraintRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" [{} p{}] {}",
            self.definition.name, self.definition.domain, self.definition.priority, self.definition.body
        )
    }
}

/// A field value read from an [`EvalContext`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value<'a> {
    Number(f64),
    Text(&'a str),
}

/// What a `REQUIRE` expression sees: one proposition, the command around it
/// (if any), and its effective confidence.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    pub proposition: &'a Proposition,
    pub confidence: f64,
    pub intent: Option<&'a str>,
    pub effect: Option<&'a DeclaredEffect>,
}

impl<'a> EvalContext<'a> {
    pub fn new(proposition: &'a Proposition) -> Self {
        Self {
            proposition,
            confidence: proposition.confidence.value(),
            intent: None,
            effect: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_command(mut self, intent: Option<&'a str>, effect: Option<&'a DeclaredEffect>) -> Self {
        self.intent = intent;
        self.effect = effect;
        self
    }

    pub fn field(&self, field: Field) -> Option<Value<'a>> {
        let p = self.proposition;
        Some(match field {
            Field::Subject => Value::Text(&p.triple.subject),
            Field::Predicate => Value::Text(&p.triple.predicate),
            Field::Object => Value::Text(&p.triple.object),
            Field::Domain => Value::Text(&p.domain),
            Field::Source => Value::Text(&p.origin.source),
            Field::Intent => Value::Text(self.intent?),
            Field::Confidence => Value::Number(self.confidence),
            Field::Evidence => Value::Number(p.evidence.len() as f64),
            Field::Magnitude => Value::Number(self.effect?.magnitude),
            Field::Benefit => Value::Number(self.effect?.systemic_benefit),
        })
    }
}
