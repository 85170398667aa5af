//! Parser: recursive descent over the rule grammar.
//!
//! ```text
//! rules      := rule* EOF
//! rule       := RULE string '{' clause* '}'
//! clause     := DOMAIN (ident | '*') | PRIORITY number | OBLIGATION string | body
//! body       := EXCLUSIVE ident '{' ident+ '}'
//!             | IMPLIES pattern '->' pattern [CONFIDENCE number]
//!             | REQUIRE expr
//!             | SURVIVAL ident RATIO number
//! pattern    := [NOT] ident ident
//! expr       := conj (OR conj)*
//! conj       := unary (AND unary)*
//! unary      := NOT unary | '(' expr ')' | ident cmp literal
//! ```
//!
//! The parser only checks shape. Names are resolved against the vocabulary
//! by the compiler.

use logos_types::Polarity;
use std::collections::BTreeSet;

use crate::error::CompileError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::rule::{CmpOp, Expr, Field, Literal, Pattern, RuleBody, ANY_DOMAIN};

/// One rule as written, before vocabulary resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRule {
    pub name: String,
    pub domain: Option<String>,
    pub priority: Option<u32>,
    pub obligation: Option<String>,
    pub body: Option<RuleBody>,
    pub line: usize,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse rule text into zero or more rules.
    pub fn parse(input: &str) -> Result<Vec<ParsedRule>, CompileError> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Self { tokens, pos: 0 };
        let mut rules = Vec::new();
        while !parser.check(TokenKind::Eof) {
            rules.push(parser.parse_rule()?);
        }
        Ok(rules)
    }

    fn parse_rule(&mut self) -> Result<ParsedRule, CompileError> {
        let line = self.expect(TokenKind::Rule)?.line;
        let name = self.expect(TokenKind::StringLiteral)?.text.clone();
        self.expect(TokenKind::OpenBrace)?;

        let mut rule = ParsedRule {
            name,
            domain: None,
            priority: None,
            obligation: None,
            body: None,
            line,
        };

        while !self.check(TokenKind::CloseBrace) && !self.check(TokenKind::Eof) {
            match self.peek().kind {
                TokenKind::Domain => {
                    self.advance();
                    let domain = if self.check(TokenKind::Star) {
                        self.advance();
                        ANY_DOMAIN.to_string()
                    } else {
                        self.expect_identifier()?
                    };
                    set_once(&mut rule.domain, domain, &rule.name, "DOMAIN")?;
                }
                TokenKind::Priority => {
                    self.advance();
                    let priority = self.expect_priority()?;
                    set_once(&mut rule.priority, priority, &rule.name, "PRIORITY")?;
                }
                TokenKind::Obligation => {
                    self.advance();
                    let text = self.expect(TokenKind::StringLiteral)?.text.clone();
                    set_once(&mut rule.obligation, text, &rule.name, "OBLIGATION")?;
                }
                TokenKind::Exclusive | TokenKind::Implies | TokenKind::Require | TokenKind::Survival => {
                    let body = self.parse_body()?;
                    set_once(&mut rule.body, body, &rule.name, "body")?;
                }
                _ => {
                    let tok = self.peek();
                    return Err(CompileError::UnexpectedToken {
                        expected: "a rule clause".into(),
                        found: tok.text.clone(),
                        line: tok.line,
                        col: tok.col,
                    });
                }
            }
        }

        self.expect(TokenKind::CloseBrace)?;
        Ok(rule)
    }

    fn parse_body(&mut self) -> Result<RuleBody, CompileError> {
        let keyword = self.advance().kind;
        match keyword {
            TokenKind::Exclusive => {
                let predicate = self.expect_identifier()?;
                self.expect(TokenKind::OpenBrace)?;
                let mut objects = BTreeSet::new();
                while self.check(TokenKind::Identifier) {
                    objects.insert(self.expect_identifier()?);
                }
                self.expect(TokenKind::CloseBrace)?;
                if objects.len() < 2 {
                    return Err(CompileError::InvalidValue {
                        field: "EXCLUSIVE".into(),
                        message: "at least two distinct objects are required".into(),
                    });
                }
                Ok(RuleBody::Exclusive { predicate, objects })
            }
            TokenKind::Implies => {
                let antecedent = self.parse_pattern()?;
                self.expect(TokenKind::Arrow)?;
                let consequent = self.parse_pattern()?;
                let confidence = if self.check(TokenKind::Confidence) {
                    self.advance();
                    let value = self.expect_decimal("CONFIDENCE")?;
                    if !(0.0..=1.0).contains(&value) {
                        return Err(CompileError::InvalidValue {
                            field: "CONFIDENCE".into(),
                            message: format!("{value} is outside [0, 1]"),
                        });
                    }
                    Some(value)
                } else {
                    None
                };
                Ok(RuleBody::Implies {
                    antecedent,
                    consequent,
                    confidence,
                })
            }
            TokenKind::Require => Ok(RuleBody::Require(self.parse_expr()?)),
            _ => {
                let intent = self.expect_identifier()?;
                self.expect(TokenKind::Ratio)?;
                let max_ratio = self.expect_decimal("RATIO")?;
                if max_ratio <= 0.0 {
                    return Err(CompileError::InvalidValue {
                        field: "RATIO".into(),
                        message: "must be positive".into(),
                    });
                }
                Ok(RuleBody::Survival { intent, max_ratio })
            }
        }
    }

    fn parse_pattern(&mut self) -> Result<Pattern, CompileError> {
        let polarity = if self.check(TokenKind::Not) {
            self.advance();
            Polarity::Negated
        } else {
            Polarity::Affirmed
        };
        let predicate = self.expect_identifier()?;
        let object = self.expect_identifier()?;
        Ok(Pattern {
            predicate,
            object,
            polarity,
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_conjunction()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_conjunction()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_conjunction(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if self.check(TokenKind::Not) {
            self.advance();
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.check(TokenKind::OpenParen) {
            self.advance();
            let inner = self.parse_expr()?;
            self.expect(TokenKind::CloseParen)?;
            return Ok(inner);
        }

        let name = self.expect_identifier()?;
        let field = Field::parse(&name).ok_or(CompileError::UnknownField(name))?;
        let op = match self.peek().kind {
            TokenKind::Eq => CmpOp::Eq,
            TokenKind::Ne => CmpOp::Ne,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            _ => {
                let tok = self.peek();
                return Err(CompileError::UnexpectedToken {
                    expected: "comparison operator".into(),
                    found: tok.text.clone(),
                    line: tok.line,
                    col: tok.col,
                });
            }
        };
        self.advance();

        let tok = self.advance().clone();
        let value = match tok.kind {
            TokenKind::NumberLiteral => Literal::Number(parse_decimal(&tok.text, "literal")?),
            TokenKind::Identifier | TokenKind::StringLiteral => Literal::Text(tok.text),
            _ => {
                return Err(CompileError::UnexpectedToken {
                    expected: "literal".into(),
                    found: tok.text,
                    line: tok.line,
                    col: tok.col,
                })
            }
        };
        Ok(Expr::Compare { field, op, value })
    }

    // ---- token helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else if self.check(TokenKind::Eof) {
            Err(CompileError::UnexpectedEof(kind.to_string()))
        } else {
            let tok = self.peek();
            Err(CompileError::UnexpectedToken {
                expected: kind.to_string(),
                found: tok.text.clone(),
                line: tok.line,
                col: tok.col,
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        Ok(self.expect(TokenKind::Identifier)?.text.clone())
    }

    fn expect_decimal(&mut self, field: &str) -> Result<f64, CompileError> {
        let text = self.expect(TokenKind::NumberLiteral)?.text.clone();
        parse_decimal(&text, field)
    }

    fn expect_priority(&mut self) -> Result<u32, CompileError> {
        let text = self.expect(TokenKind::NumberLiteral)?.text.clone();
        text.parse::<u32>().map_err(|_| CompileError::InvalidValue {
            field: "PRIORITY".into(),
            message: format!("'{text}' is not a whole number"),
        })
    }
}

fn parse_decimal(text: &str, field: &str) -> Result<f64, CompileError> {
    text.parse::<f64>().map_err(|_| CompileError::InvalidValue {
        field: field.into(),
        message: format!("'{text}' is not a valid number"),
    })
}

fn set_once<T>(slot: &mut Option<T>, value: T, rule: &str, clause: &'static str) -> Result<(), CompileError> {
    if slot.is_some() {
        return Err(CompileError::DuplicateClause {
            rule: rule.to_string(),
            clause,
        });
    }
    *slot = Some(value);
    Ok(())
}
