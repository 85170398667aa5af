//! Adversarial test: council approvals cannot be replayed onto another
//! operation, and a reset challenge expires once the ledger moves.

use logos_gate::GateError;
use logos_override::{OverrideError, OverrideMode, ResetRequest};
use logos_rules::{admission_message, amendment_message, RuleSetError};
use logos_tests::{outsider_key, taxonomy, Kernel};
use logos_types::{Approval, QuorumError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BIRD_REPTILE: &str = r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#;
const BIRD_FISH: &str = r#"RULE "bird-fish" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird fish } }"#;

fn suspended_kernel() -> Kernel {
    let kernel = Kernel::new();
    kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);
    kernel
}

fn is_unauthorized_reset(result: &Result<logos_ledger::ProofRecordId, GateError>) -> bool {
    matches!(
        result,
        Err(GateError::Override(OverrideError::Unauthorized(QuorumError::Insufficient { .. })))
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn approvals_do_not_transfer_between_rules() {
    let kernel = Kernel::new();
    let approved = kernel.gate.compile_rule(BIRD_REPTILE).unwrap();
    let approvals = kernel.approve(&admission_message(&approved.id), 3);

    let other = kernel.gate.compile_rule(BIRD_FISH).unwrap();
    let err = kernel.gate.admit_rule(other, &approvals).unwrap_err();
    assert!(matches!(err, GateError::RuleSet(RuleSetError::Unauthorized(_))));
    assert_eq!(kernel.ledger_len(), 0);

    kernel.gate.admit_rule(approved, &approvals).unwrap();
    assert_eq!(kernel.ledger_len(), 1);
}

#[test]
fn admission_approvals_cannot_authorize_an_amendment() {
    let kernel = Kernel::new();
    let original = kernel.gate.compile_rule(BIRD_REPTILE).unwrap();
    let original_id = original.id.clone();
    kernel
        .gate
        .admit_rule(original, &kernel.approve(&admission_message(&original_id), 2))
        .unwrap();

    let replacement = kernel.gate.compile_rule(BIRD_FISH).unwrap();
    let wrong = kernel.approve(&admission_message(&replacement.id), 2);
    let err = kernel.gate.amend_rule(&original_id, replacement.clone(), &wrong).unwrap_err();
    assert!(matches!(err, GateError::RuleSet(RuleSetError::Unauthorized(_))));
    assert!(kernel.gate.rules().snapshot().get(&original_id).is_some());

    let right = kernel.approve(&amendment_message(&original_id, &replacement.id), 2);
    kernel.gate.amend_rule(&original_id, replacement, &right).unwrap();
    assert!(kernel.gate.rules().snapshot().get(&original_id).is_none());
}

#[test]
fn outsiders_do_not_count_toward_quorum() {
    let kernel = Kernel::new();
    let rule = kernel.gate.compile_rule(BIRD_REPTILE).unwrap();
    let message = admission_message(&rule.id);
    let mut approvals = kernel.approve(&message, 1);
    approvals.push(Approval::sign(&outsider_key(), &message));

    let err = kernel.gate.admit_rule(rule, &approvals).unwrap_err();
    assert!(matches!(
        err,
        GateError::RuleSet(RuleSetError::Unauthorized(QuorumError::Insufficient { valid: 1, required: 2 }))
    ));
}

#[test]
fn reset_challenge_expires_when_the_ledger_moves() {
    let kernel = suspended_kernel();
    let reason = "operator reviewed the taxonomy conflict";
    let stale = kernel.approve(&kernel.gate.reset_challenge(reason).unwrap(), 2);

    // Submissions while suspended are still ledgered and move the head.
    kernel.gate.submit(taxonomy("felix", "cat")).unwrap();

    let result = kernel.gate.reset_override(&ResetRequest::new(reason, stale));
    assert!(is_unauthorized_reset(&result), "{result:?}");
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);

    let fresh = kernel.approve(&kernel.gate.reset_challenge(reason).unwrap(), 2);
    kernel.gate.reset_override(&ResetRequest::new(reason, fresh)).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Normal);
}

#[test]
fn successful_reset_cannot_be_replayed() {
    let kernel = suspended_kernel();
    let reason = "first incident";
    let approvals = kernel.approve(&kernel.gate.reset_challenge(reason).unwrap(), 2);
    let request = ResetRequest::new(reason, approvals);
    kernel.gate.reset_override(&request).unwrap();

    // The reset record itself moved the head.
    assert!(is_unauthorized_reset(&kernel.gate.reset_override(&request)));
    let fresh = kernel.approve(&kernel.gate.reset_challenge(reason).unwrap(), 2);
    let err = kernel.gate.reset_override(&ResetRequest::new(reason, fresh)).unwrap_err();
    assert!(matches!(err, GateError::Override(OverrideError::NotSuspended)));

    kernel.gate.submit(taxonomy("nemo", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("nemo", "fish")).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);
    assert!(is_unauthorized_reset(&kernel.gate.reset_override(&request)));
}

#[test]
fn reset_with_changed_reason_fails() {
    let kernel = suspended_kernel();
    let approvals = kernel.approve(&kernel.gate.reset_challenge("routine check").unwrap(), 2);
    let result = kernel
        .gate
        .reset_override(&ResetRequest::new("disable the override for a week", approvals));
    assert!(is_unauthorized_reset(&result));
}
