//! Policy Council approvals.
//!
//! Rule admission and override reset are privileged. Each carries a set of
//! ed25519 approvals over an operation-specific message; the kernel counts
//! distinct council members with a valid signature and refuses the
//! operation below quorum.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{QuorumError, TypeError};
use crate::proposition::{decode_signature, decode_verifying_key};

/// One council member's signature over an operation message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Hex-encoded verifying key.
    pub signer: String,
    /// Hex-encoded signature.
    pub signature: String,
}

impl Approval {
    pub fn sign(key: &SigningKey, message: &[u8]) -> Self {
        let signature = key.sign(message);
        Self {
            signer: hex::encode(key.verifying_key().as_bytes()),
            signature: hex::encode(signature.to_bytes()),
        }
    }

    /// Verify this approval and return the signer's key.
    pub fn verify(&self, message: &[u8]) -> Result<VerifyingKey, TypeError> {
        let key = decode_verifying_key(&self.signer)?;
        let signature = decode_signature(&self.signature)?;
        key.verify(message, &signature)
            .map_err(|_| TypeError::SignatureMismatch)?;
        Ok(key)
    }
}

/// Evidence that a quorum approved a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuorumCertificate {
    /// Hex keys of the members whose approvals verified.
    pub signers: BTreeSet<String>,
    pub required: usize,
}

/// The set of keys authorized to admit rules and reset the override.
#[derive(Clone, Debug)]
pub struct PolicyCouncil {
    members: Vec<VerifyingKey>,
    quorum: usize,
}

impl PolicyCouncil {
    pub fn new(members: Vec<VerifyingKey>, quorum: usize) -> Result<Self, QuorumError> {
        let distinct: BTreeSet<[u8; 32]> = members.iter().map(|k| k.to_bytes()).collect();
        if quorum == 0 || quorum > distinct.len() {
            return Err(QuorumError::InvalidCouncil {
                quorum,
                members: distinct.len(),
            });
        }
        Ok(Self { members, quorum })
    }

    /// Build a council from hex-encoded verifying keys (configuration form).
    pub fn from_hex_keys<S: AsRef<str>>(keys: &[S], quorum: usize) -> Result<Self, QuorumError> {
        let members = keys
            .iter()
            .map(|k| {
                decode_verifying_key(k.as_ref())
                    .map_err(|_| QuorumError::InvalidMemberKey(k.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(members, quorum)
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn members(&self) -> &[VerifyingKey] {
        &self.members
    }

    fn is_member(&self, key: &VerifyingKey) -> bool {
        self.members.iter().any(|m| m == key)
    }

    /// Verify that at least `quorum` distinct members signed `message`.
    ///
    /// Malformed, forged, non-member and duplicate approvals never count.
    pub fn verify_quorum(
        &self,
        message: &[u8],
        approvals: &[Approval],
    ) -> Result<QuorumCertificate, QuorumError> {
        let mut signers = BTreeSet::new();
        for approval in approvals {
            if let Ok(key) = approval.verify(message) {
                if self.is_member(&key) {
                    signers.insert(hex::encode(key.as_bytes()));
                }
            }
        }

        if signers.len() < self.quorum {
            return Err(QuorumError::Insufficient {
                valid: signers.len(),
                required: self.quorum,
            });
        }

        Ok(QuorumCertificate {
            signers,
            required: self.quorum,
        })
    }
}
