use logos_journal::JournalError;
use logos_types::{QuorumError, RuleId, TypeError};
use thiserror::Error;

/// Vocabulary category of an undefined reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    Domain,
    Predicate,
    Term,
    Intent,
}

impl std::fmt::Display for TermKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TermKind::Domain => "domain",
            TermKind::Predicate => "predicate",
            TermKind::Term => "term",
            TermKind::Intent => "intent",
        };
        f.write_str(s)
    }
}

/// Rule text that cannot become a rule. Nothing partial is ever produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("parse error at line {line}, column {col}: {message}")]
    Parse {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("line {line}, column {col}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        col: usize,
    },

    #[error("unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("undefined {kind} '{term}'")]
    UndefinedTerm { kind: TermKind, term: String },

    #[error("rule '{rule}' is missing its {clause} clause")]
    MissingClause { rule: String, clause: &'static str },

    #[error("rule '{rule}' repeats its {clause} clause")]
    DuplicateClause { rule: String, clause: &'static str },

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("expected exactly one rule, found {0}")]
    RuleCount(usize),

    #[error("rule digest failed: {0}")]
    Digest(#[from] TypeError),
}

/// Errors from Rule Set admission and amendment.
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("priority {priority} in domain '{domain}' already held by {existing}")]
    PriorityConflict {
        domain: String,
        priority: u32,
        existing: RuleId,
    },

    #[error("policy council approval failed: {0}")]
    Unauthorized(#[from] QuorumError),

    #[error("rule already admitted: {0}")]
    AlreadyAdmitted(RuleId),

    #[error("rule is not active: {0}")]
    NotActive(RuleId),

    #[error("journaled rule {0} does not match its digest")]
    Tampered(RuleId),

    #[error("persistence failed: {0}")]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Type(#[from] TypeError),
}
