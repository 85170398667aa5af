#![deny(unsafe_code)]
//! # logos-override
//!
//! The Override Controller. It is a two-state machine, `Normal` and
//! `Suspended`, driven by the severity of refused candidates. Every
//! transition is returned as a [`Transition`] value for the Command Gate to
//! record in the Proof Ledger.

pub mod config;
pub mod controller;
pub mod error;
pub mod reset;
pub mod state;

pub use config::{OverrideConfig, SeverityDecay};
pub use controller::OverrideController;
pub use error::OverrideError;
pub use reset::{reset_message, ResetRequest};
pub use state::{OverrideMode, OverrideStatus, Transition};
