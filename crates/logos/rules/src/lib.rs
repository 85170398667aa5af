#![deny(unsafe_code)]
//! # logos-rules
//!
//! Declarative constraint rules for the Logos kernel.
//!
//! Rule text is tokenized by [`lexer`], parsed by [`parser`] and resolved
//! against a closed [`Vocabulary`] by the [`RuleCompiler`]. Admitted rules
//! live in a [`RuleSet`], an immutable [`RuleSnapshot`] swapped on every
//! admission or amendment, each of which requires a Policy Council quorum.
//!
//! ```text
//! RULE "mammal-fish-exclusive" {
//!     DOMAIN taxonomy
//!     PRIORITY 9
//!     EXCLUSIVE is_a { mammal fish }
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod rule;
pub mod ruleset;
pub mod vocabulary;

pub use compiler::RuleCompiler;
pub use error::{CompileError, RuleSetError, TermKind};
pub use rule::{
    CmpOp, ConstraintRule, EvalContext, Expr, Field, Literal, Pattern, Provenance, RuleBody,
    RuleDefinition, Value, ANY_DOMAIN,
};
pub use ruleset::{admission_message, amendment_message, RuleSet, RuleSetConfig, RuleSnapshot, StagedAdmission};
pub use vocabulary::{Vocabulary, STANDARD_ANTONYMS};
