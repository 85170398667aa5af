#![deny(unsafe_code)]
//! # logos-gate
//!
//! The Command Gate and kernel assembly.
//!
//! ```text
//! candidate ─▶ Contradiction Engine ─▶ Override filter ─▶ Proof Ledger
//!                 (rules + store)                           │
//!                                       store commit ◀──────┤ (on Accept)
//!                                   override counter ◀──────┘
//! ```
//!
//! [`CommandGate::submit`] is the only path by which propositions enter the
//! store. Rule admission, amendment and override resets also go through the
//! gate so that each is ledgered.

pub mod config;
pub mod error;
pub mod gate;
pub mod status;

pub use config::{CouncilConfig, KernelConfig, StorageConfig};
pub use error::GateError;
pub use gate::{CommandGate, CommandGateBuilder};
pub use status::KernelStatus;
