#![deny(unsafe_code)]
//! # logos-types
//!
//! Shared data model for the Logos validation kernel.
//!
//! - [`Proposition`]: a typed `(subject, predicate, object)` claim with
//!   provenance, weakest-link [`Confidence`] and opaque evidence references
//! - [`Candidate`]: the unit the Command Gate evaluates, either a claim or a
//!   [`Command`] (one or more propositions plus an intent tag)
//! - [`ContentHash`]: BLAKE3 content address used by rules and the ledger
//! - [`Approval`] / [`PolicyCouncil`]: ed25519 quorum verification for the
//!   privileged operations (rule admission, override reset)
//! - [`Clock`]: injectable time source

pub mod approval;
pub mod candidate;
pub mod clock;
pub mod error;
pub mod hash;
pub mod ids;
pub mod proposition;

pub use approval::{Approval, PolicyCouncil, QuorumCertificate};
pub use candidate::{Candidate, Command, DeclaredEffect, IntentTag};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{QuorumError, TypeError};
pub use hash::ContentHash;
pub use ids::{CommandId, PropositionId, RuleId};
pub use proposition::{
    Confidence, EvidenceRef, Origin, OriginStatus, Polarity, Proposition, PropositionBuilder,
    Triple,
};
