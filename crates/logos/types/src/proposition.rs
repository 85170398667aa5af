use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypeError;
use crate::hash::ContentHash;
use crate::ids::PropositionId;

const PROPOSITION_DIGEST_DOMAIN: &[u8] = b"logos-proposition-v1:";

/// Normalize a vocabulary term: trimmed, lower-case.
pub(crate) fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A `(subject, predicate, object)` statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    /// Build a triple, normalizing every term.
    pub fn new(
        subject: impl AsRef<str>,
        predicate: impl AsRef<str>,
        object: impl AsRef<str>,
    ) -> Result<Self, TypeError> {
        let subject = normalize_term(subject.as_ref());
        let predicate = normalize_term(predicate.as_ref());
        let object = normalize_term(object.as_ref());
        if subject.is_empty() {
            return Err(TypeError::EmptyTerm("subject"));
        }
        if predicate.is_empty() {
            return Err(TypeError::EmptyTerm("predicate"));
        }
        if object.is_empty() {
            return Err(TypeError::EmptyTerm("object"));
        }
        Ok(Self {
            subject,
            predicate,
            object,
        })
    }

    /// Same subject and object, different predicate.
    pub fn with_predicate(&self, predicate: &str) -> Self {
        Self {
            subject: self.subject.clone(),
            predicate: predicate.to_string(),
            object: self.object.clone(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// Whether a proposition asserts or denies its triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Polarity {
    Affirmed,
    Negated,
}

impl Polarity {
    pub fn negate(self) -> Self {
        match self {
            Polarity::Affirmed => Polarity::Negated,
            Polarity::Negated => Polarity::Affirmed,
        }
    }
}

/// Confidence in [0, 1] with its rationale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    value: f64,
    rationale: String,
}

impl Confidence {
    pub fn new(value: f64, rationale: impl Into<String>) -> Result<Self, TypeError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(TypeError::InvalidConfidence(value));
        }
        let rationale = rationale.into();
        if rationale.trim().is_empty() {
            return Err(TypeError::MissingRationale);
        }
        Ok(Self { value, rationale })
    }

    /// Full confidence.
    pub fn certain(rationale: impl Into<String>) -> Result<Self, TypeError> {
        Self::new(1.0, rationale)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }
}

/// Opaque reference into an external evidence store, or a supersession link.
///
/// The kernel never dereferences `External` references; it only records them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceRef {
    External(String),
    Supersedes(PropositionId),
}

/// Source descriptor and optional ed25519 origin signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub source: String,
    /// Hex-encoded verifying key of the signer.
    pub signer: Option<String>,
    /// Hex-encoded signature over [`Proposition::content_digest`].
    pub signature: Option<String>,
}

impl Origin {
    pub fn unsigned(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            signer: None,
            signature: None,
        }
    }
}

/// Result of checking an origin signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OriginStatus {
    Unsigned,
    Verified,
    Invalid(String),
}

/// A typed, provenance-tagged claim.
///
/// Propositions are never mutated once committed. Superseding knowledge is
/// a new proposition carrying [`EvidenceRef::Supersedes`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposition {
    pub id: PropositionId,
    pub triple: Triple,
    pub polarity: Polarity,
    pub domain: String,
    pub origin: Origin,
    pub ingested_at: DateTime<Utc>,
    pub confidence: Confidence,
    pub evidence: Vec<EvidenceRef>,
}

/// The fields covered by the origin signature.
#[derive(Serialize)]
struct SignedContent<'a> {
    id: &'a PropositionId,
    triple: &'a Triple,
    polarity: &'a Polarity,
    domain: &'a str,
    source: &'a str,
    confidence: &'a Confidence,
    evidence: &'a [EvidenceRef],
}

impl Proposition {
    pub fn builder(triple: Triple, domain: impl AsRef<str>) -> PropositionBuilder {
        PropositionBuilder::new(triple, domain)
    }

    /// Digest of the signed content (excludes ingestion time and signature).
    pub fn content_digest(&self) -> Result<ContentHash, TypeError> {
        ContentHash::digest_json(
            PROPOSITION_DIGEST_DOMAIN,
            &SignedContent {
                id: &self.id,
                triple: &self.triple,
                polarity: &self.polarity,
                domain: &self.domain,
                source: &self.origin.source,
                confidence: &self.confidence,
                evidence: &self.evidence,
            },
        )
    }

    /// Sign the content digest as the origin of this proposition.
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), TypeError> {
        let digest = self.content_digest()?;
        let signature = key.sign(digest.as_bytes());
        self.origin.signer = Some(hex::encode(key.verifying_key().as_bytes()));
        self.origin.signature = Some(hex::encode(signature.to_bytes()));
        Ok(())
    }

    /// Check the origin signature, if one is attached.
    pub fn verify_origin(&self) -> OriginStatus {
        let (signer, signature) = match (&self.origin.signer, &self.origin.signature) {
            (None, None) => return OriginStatus::Unsigned,
            (Some(signer), Some(signature)) => (signer, signature),
            _ => return OriginStatus::Invalid("signer and signature must both be present".into()),
        };

        let key = match decode_verifying_key(signer) {
            Ok(key) => key,
            Err(e) => return OriginStatus::Invalid(e.to_string()),
        };
        let signature = match decode_signature(signature) {
            Ok(sig) => sig,
            Err(e) => return OriginStatus::Invalid(e.to_string()),
        };
        let digest = match self.content_digest() {
            Ok(d) => d,
            Err(e) => return OriginStatus::Invalid(e.to_string()),
        };

        match key.verify(digest.as_bytes(), &signature) {
            Ok(()) => OriginStatus::Verified,
            Err(_) => OriginStatus::Invalid("signature does not match content".into()),
        }
    }

    /// Stamp the ingestion time. Used once, by the Command Gate.
    pub fn ingested(mut self, at: DateTime<Utc>) -> Self {
        self.ingested_at = at;
        self
    }

    /// Ids of the propositions this one supersedes.
    pub fn superseded_ids(&self) -> impl Iterator<Item = &PropositionId> {
        self.evidence.iter().filter_map(|e| match e {
            EvidenceRef::Supersedes(id) => Some(id),
            EvidenceRef::External(_) => None,
        })
    }

    /// Human-readable form, e.g. `cats is_a mammal` or `NOT cats is_a fish`.
    pub fn describe(&self) -> String {
        match self.polarity {
            Polarity::Affirmed => self.triple.to_string(),
            Polarity::Negated => format!("NOT {}", self.triple),
        }
    }
}

pub(crate) fn decode_verifying_key(hex_key: &str) -> Result<VerifyingKey, TypeError> {
    let bytes = hex::decode(hex_key).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    let array: [u8; 32] = bytes.try_into().map_err(|_| TypeError::InvalidKey)?;
    VerifyingKey::from_bytes(&array).map_err(|_| TypeError::InvalidKey)
}

pub(crate) fn decode_signature(hex_sig: &str) -> Result<Signature, TypeError> {
    let bytes = hex::decode(hex_sig).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    let array: [u8; 64] = bytes.try_into().map_err(|_| TypeError::InvalidKey)?;
    Ok(Signature::from_bytes(&array))
}

/// Builder for [`Proposition`] drafts.
pub struct PropositionBuilder {
    id: PropositionId,
    triple: Triple,
    polarity: Polarity,
    domain: String,
    origin: Origin,
    confidence: Option<Confidence>,
    evidence: Vec<EvidenceRef>,
}

impl PropositionBuilder {
    pub fn new(triple: Triple, domain: impl AsRef<str>) -> Self {
        Self {
            id: PropositionId::new(),
            triple,
            polarity: Polarity::Affirmed,
            domain: normalize_term(domain.as_ref()),
            origin: Origin::unsigned("unknown"),
            confidence: None,
            evidence: Vec::new(),
        }
    }

    pub fn id(mut self, id: PropositionId) -> Self {
        self.id = id;
        self
    }

    pub fn negated(mut self) -> Self {
        self.polarity = Polarity::Negated;
        self
    }

    pub fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.origin = Origin::unsigned(source);
        self
    }

    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn evidence(mut self, reference: impl Into<String>) -> Self {
        self.evidence.push(EvidenceRef::External(reference.into()));
        self
    }

    pub fn supersedes(mut self, previous: PropositionId) -> Self {
        self.evidence.push(EvidenceRef::Supersedes(previous));
        self
    }

    /// Finish the draft. Without an explicit confidence the claim is
    /// recorded as fully confident on the source's assertion.
    pub fn build(self) -> Result<Proposition, TypeError> {
        if self.domain.is_empty() {
            return Err(TypeError::EmptyTerm("domain"));
        }
        let confidence = match self.confidence {
            Some(c) => c,
            None => Confidence::certain(format!("asserted by {}", self.origin.source))?,
        };
        Ok(Proposition {
            id: self.id,
            triple: self.triple,
            polarity: self.polarity,
            domain: self.domain,
            origin: self.origin,
            ingested_at: Utc::now(),
            confidence,
            evidence: self.evidence,
        })
    }
}
