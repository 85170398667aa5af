//! Rule compiler: parsed text plus vocabulary to [`ConstraintRule`].
//!
//! Compilation is pure apart from the provenance timestamp. The same text
//! against the same vocabulary always yields an equal [`RuleDefinition`]
//! and therefore the same [`logos_types::RuleId`].

use logos_types::{Clock, SystemClock};
use std::sync::Arc;
use tracing::debug;

use crate::error::{CompileError, TermKind};
use crate::parser::{ParsedRule, Parser};
use crate::rule::{
    CmpOp, ConstraintRule, Expr, Field, Literal, Pattern, Provenance, RuleBody, RuleDefinition,
};
use crate::vocabulary::Vocabulary;

pub const DEFAULT_AUTHOR: &str = "policy-council";

pub struct RuleCompiler {
    vocabulary: Arc<Vocabulary>,
    clock: Arc<dyn Clock>,
}

impl RuleCompiler {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Compile text containing exactly one rule.
    pub fn compile(&self, text: &str) -> Result<ConstraintRule, CompileError> {
        let mut rules = self.compile_all(text)?;
        if rules.len() != 1 {
            return Err(CompileError::RuleCount(rules.len()));
        }
        Ok(rules.remove(0))
    }

    /// Compile every rule in `text`. Any error rejects the whole text.
    pub fn compile_all(&self, text: &str) -> Result<Vec<ConstraintRule>, CompileError> {
        Parser::parse(text)?
            .into_iter()
            .map(|parsed| self.resolve(parsed))
            .collect()
    }

    fn resolve(&self, parsed: ParsedRule) -> Result<ConstraintRule, CompileError> {
        let missing = |clause| CompileError::MissingClause {
            rule: parsed.name.clone(),
            clause,
        };
        let domain = parsed.domain.as_deref().ok_or_else(|| missing("DOMAIN"))?;
        let priority = parsed.priority.ok_or_else(|| missing("PRIORITY"))?;
        let body = parsed.body.as_ref().ok_or_else(|| missing("body"))?;

        let definition = RuleDefinition {
            name: parsed.name.clone(),
            domain: self.vocabulary.require(TermKind::Domain, domain)?,
            priority,
            obligation: parsed.obligation.clone(),
            body: self.resolve_body(body)?,
        };
        let id = definition.digest()?;
        debug!(rule = %id, name = %definition.name, class = definition.body.class(), "Rule compiled");

        Ok(ConstraintRule {
            id,
            definition,
            provenance: Provenance {
                author: DEFAULT_AUTHOR.to_string(),
                compiled_at: self.clock.now(),
                approvals: Vec::new(),
                version: 1,
                supersedes: None,
            },
        })
    }

    fn resolve_body(&self, body: &RuleBody) -> Result<RuleBody, CompileError> {
        let vocab = &self.vocabulary;
        Ok(match body {
            RuleBody::Exclusive { predicate, objects } => RuleBody::Exclusive {
                predicate: vocab.require(TermKind::Predicate, predicate)?,
                objects: objects
                    .iter()
                    .map(|o| vocab.require(TermKind::Term, o))
                    .collect::<Result<_, _>>()?,
            },
            RuleBody::Implies {
                antecedent,
                consequent,
                confidence,
            } => RuleBody::Implies {
                antecedent: self.resolve_pattern(antecedent)?,
                consequent: self.resolve_pattern(consequent)?,
                confidence: *confidence,
            },
            RuleBody::Require(expr) => RuleBody::Require(self.resolve_expr(expr)?),
            RuleBody::Survival { intent, max_ratio } => RuleBody::Survival {
                intent: vocab.require(TermKind::Intent, intent)?,
                max_ratio: *max_ratio,
            },
        })
    }

    fn resolve_pattern(&self, pattern: &Pattern) -> Result<Pattern, CompileError> {
        Ok(Pattern {
            predicate: self.vocabulary.require(TermKind::Predicate, &pattern.predicate)?,
            object: self.vocabulary.require(TermKind::Term, &pattern.object)?,
            polarity: pattern.polarity,
        })
    }

    fn resolve_expr(&self, expr: &Expr) -> Result<Expr, CompileError> {
        Ok(match expr {
            Expr::And(a, b) => Expr::And(Box::new(self.resolve_expr(a)?), Box::new(self.resolve_expr(b)?)),
            Expr::Or(a, b) => Expr::Or(Box::new(self.resolve_expr(a)?), Box::new(self.resolve_expr(b)?)),
            Expr::Not(e) => Expr::Not(Box::new(self.resolve_expr(e)?)),
            Expr::Compare { field, op, value } => Expr::Compare {
                field: *field,
                op: *op,
                value: self.resolve_literal(*field, *op, value)?,
            },
        })
    }

    fn resolve_literal(&self, field: Field, op: CmpOp, value: &Literal) -> Result<Literal, CompileError> {
        let invalid = |message: String| CompileError::InvalidValue {
            field: field.to_string(),
            message,
        };
        match value {
            Literal::Number(n) if field.is_numeric() => Ok(Literal::Number(*n)),
            Literal::Number(n) => Err(invalid(format!("cannot compare text field with number {n}"))),
            Literal::Text(t) if field.is_numeric() => {
                Err(invalid(format!("cannot compare numeric field with '{t}'")))
            }
            Literal::Text(_) if !matches!(op, CmpOp::Eq | CmpOp::Ne) => {
                Err(invalid(format!("operator {op} needs a numeric field")))
            }
            Literal::Text(t) => {
                let kind = match field {
                    Field::Subject | Field::Object => TermKind::Term,
                    Field::Predicate => TermKind::Predicate,
                    Field::Domain => TermKind::Domain,
                    Field::Intent => TermKind::Intent,
                    // Sources are free-form descriptors.
                    _ => return Ok(Literal::Text(t.clone())),
                };
                Ok(Literal::Text(self.vocabulary.require(kind, t)?))
            }
        }
    }
}
