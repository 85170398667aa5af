#![deny(unsafe_code)]
//! # logos-engine
//!
//! The Contradiction Engine decides whether a candidate claim or command is
//! consistent with the committed facts and the active rules.
//!
//! A verdict is either an `Accept` with its success proof (premises and
//! inference steps) or a `Refuse` with a minimal [`Counterexample`]. A
//! refusal is a value, not an error.

mod closure;
pub mod config;
pub mod engine;
pub mod verdict;

pub use config::EngineConfig;
pub use engine::{ContradictionEngine, Derivation};
pub use verdict::{
    Counterexample, Decision, EvaluationBasis, InferenceStep, Premise, RefusalKind, Uncertainty,
    Verdict, Violation,
};
