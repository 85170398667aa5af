#![deny(unsafe_code)]
//! # logos-store
//!
//! The Proposition Store holds every committed claim in ingestion order.
//! Nothing is ever removed: a newer proposition that references an older one
//! through [`logos_types::EvidenceRef::Supersedes`] marks it superseded.
//!
//! Readers never block each other. Writes are journaled before they are
//! acknowledged when the store is opened over a [`logos_journal::Journal`].

pub mod error;
pub mod query;
pub mod store;

pub use error::StoreError;
pub use query::{PropositionFilter, Query, QueryIter};
pub use store::PropositionStore;
