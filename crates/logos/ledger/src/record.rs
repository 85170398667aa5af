use chrono::{DateTime, Utc};
use logos_engine::{Counterexample, Decision, InferenceStep, Premise, Uncertainty, Verdict};
use logos_types::{Approval, ContentHash};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;

const RECORD_DIGEST_DOMAIN: &[u8] = b"logos-proof-record-v1:";
const GENESIS_SEED: &[u8] = b"logos-proof-ledger-genesis-v1";

/// `prev_hash` of the first record.
pub fn genesis_hash() -> ContentHash {
    ContentHash::hash(GENESIS_SEED)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Outcome of one Command Gate submission.
    Verdict,
    /// Override Controller state change.
    Transition,
    /// Council-authorized override reset.
    Reset,
    /// Council-authorized rule admission or amendment.
    RuleAdmission,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Verdict => "verdict",
            RecordKind::Transition => "transition",
            RecordKind::Reset => "reset",
            RecordKind::RuleAdmission => "rule_admission",
        };
        f.write_str(s)
    }
}

/// Position and hash of a committed record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofRecordId {
    pub index: u64,
    pub hash: ContentHash,
}

impl fmt::Display for ProofRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proof:{}@{}", self.index, self.hash)
    }
}

/// Contents of a record before the ledger assigns its position.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDraft {
    pub kind: RecordKind,
    pub subject: String,
    pub premises: Vec<Premise>,
    pub steps: Vec<InferenceStep>,
    pub decision: Option<Decision>,
    pub counterexample: Option<Counterexample>,
    pub uncertainty: Option<Uncertainty>,
    pub approvals: Vec<Approval>,
    pub note: Option<String>,
}

impl RecordDraft {
    fn bare(kind: RecordKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            premises: Vec::new(),
            steps: Vec::new(),
            decision: None,
            counterexample: None,
            uncertainty: None,
            approvals: Vec::new(),
            note: None,
        }
    }

    pub fn verdict(verdict: &Verdict) -> Self {
        Self {
            premises: verdict.premises.clone(),
            steps: verdict.steps.clone(),
            decision: Some(verdict.decision),
            counterexample: verdict.counterexample.clone(),
            uncertainty: verdict.uncertainty.clone(),
            ..Self::bare(RecordKind::Verdict, verdict.candidate.clone())
        }
    }

    pub fn transition(subject: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::bare(RecordKind::Transition, subject)
        }
    }

    pub fn reset(reason: impl Into<String>, approvals: Vec<Approval>) -> Self {
        Self {
            approvals,
            note: Some(reason.into()),
            ..Self::bare(RecordKind::Reset, "override")
        }
    }

    pub fn rule_admission(subject: impl Into<String>, note: impl Into<String>, approvals: Vec<Approval>) -> Self {
        Self {
            approvals,
            note: Some(note.into()),
            ..Self::bare(RecordKind::RuleAdmission, subject)
        }
    }
}

/// One immutable, hash-linked ledger entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub index: u64,
    pub kind: RecordKind,
    pub subject: String,
    pub premises: Vec<Premise>,
    pub steps: Vec<InferenceStep>,
    pub decision: Option<Decision>,
    pub counterexample: Option<Counterexample>,
    pub uncertainty: Option<Uncertainty>,
    pub approvals: Vec<Approval>,
    pub note: Option<String>,
    pub prev_hash: ContentHash,
    pub recorded_at: DateTime<Utc>,
    /// BLAKE3 over every field above.
    pub hash: ContentHash,
    /// Hex ed25519 signature of the kernel over `hash`.
    pub seal: Option<String>,
}

/// The hashed view: every field except `hash` and `seal`.
#[derive(Serialize)]
struct HashedFields<'a> {
    index: u64,
    kind: RecordKind,
    subject: &'a str,
    premises: &'a [Premise],
    steps: &'a [InferenceStep],
    decision: &'a Option<Decision>,
    counterexample: &'a Option<Counterexample>,
    uncertainty: &'a Option<Uncertainty>,
    approvals: &'a [Approval],
    note: &'a Option<String>,
    prev_hash: &'a ContentHash,
    recorded_at: &'a DateTime<Utc>,
}

impl ProofRecord {
    pub(crate) fn from_draft(
        draft: RecordDraft,
        index: u64,
        prev_hash: ContentHash,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let mut record = Self {
            index,
            kind: draft.kind,
            subject: draft.subject,
            premises: draft.premises,
            steps: draft.steps,
            decision: draft.decision,
            counterexample: draft.counterexample,
            uncertainty: draft.uncertainty,
            approvals: draft.approvals,
            note: draft.note,
            prev_hash,
            recorded_at,
            hash: ContentHash::zero(),
            seal: None,
        };
        record.hash = record.compute_hash()?;
        Ok(record)
    }

    /// Recompute the content hash from the record's fields.
    pub fn compute_hash(&self) -> Result<ContentHash, LedgerError> {
        Ok(ContentHash::digest_json(
            RECORD_DIGEST_DOMAIN,
            &HashedFields {
                index: self.index,
                kind: self.kind,
                subject: &self.subject,
                premises: &self.premises,
                steps: &self.steps,
                decision: &self.decision,
                counterexample: &self.counterexample,
                uncertainty: &self.uncertainty,
                approvals: &self.approvals,
                note: &self.note,
                prev_hash: &self.prev_hash,
                recorded_at: &self.recorded_at,
            },
        )?)
    }

    pub fn id(&self) -> ProofRecordId {
        ProofRecordId {
            index: self.index,
            hash: self.hash,
        }
    }
}
