//! Adversarial test: when ledger or store writes fail, no state change
//! outlives its missing proof record, and the kernel fails closed.

use logos_gate::GateError;
use logos_ledger::RecordKind;
use logos_override::{OverrideMode, ResetRequest};
use logos_rules::admission_message;
use logos_store::StoreError;
use logos_tests::{taxonomy, Kernel};

const BIRD_REPTILE: &str = r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#;

fn suspended_kernel() -> Kernel {
    let kernel = Kernel::new();
    kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);
    kernel
}

#[test]
fn reset_without_its_record_keeps_the_kernel_suspended() {
    let kernel = suspended_kernel();
    let before = kernel.ledger_len();
    let reason = "contradiction source quarantined";
    let challenge = kernel.gate.reset_challenge(reason).unwrap();
    let request = ResetRequest::new(reason, kernel.approve(&challenge, 2));

    kernel.ledger_fails_after(0);
    let err = kernel.gate.reset_override(&request).unwrap_err();
    assert!(matches!(err, GateError::Halted { .. }));
    let status = kernel.gate.status();
    assert_eq!(status.mode, OverrideMode::Suspended);
    assert!(status.halted);
    assert_eq!(status.ledger_len, before);

    kernel.heal_ledger();
    assert!(kernel.gate.recover().unwrap().intact);

    // The head did not move, so the same approvals still answer the challenge.
    let record = kernel.gate.reset_override(&request).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Normal);
    let (records, _) = kernel.gate.export(record.index, record.index + 1).unwrap();
    assert_eq!(records[0].kind, RecordKind::Reset);
}

#[test]
fn suspension_without_its_record_does_not_engage() {
    let kernel = Kernel::new();
    kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();

    // The refusal is recorded; the transition record behind it is not.
    kernel.ledger_fails_after(1);
    let err = kernel.gate.submit(taxonomy("tom", "fish")).unwrap_err();
    assert!(matches!(err, GateError::Halted { last_verified_index: Some(1) }));
    let status = kernel.gate.status();
    assert_eq!(status.mode, OverrideMode::Normal);
    assert_eq!(status.ledger_len, 2);

    kernel.heal_ledger();
    kernel.gate.recover().unwrap();
    kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
    let status = kernel.gate.status();
    assert_eq!(status.mode, OverrideMode::Suspended);
    let (records, _) = kernel.gate.export(0, status.ledger_len).unwrap();
    assert_eq!(records.last().unwrap().kind, RecordKind::Transition);
    assert_eq!(records.iter().filter(|r| r.kind == RecordKind::Transition).count(), 1);
}

#[test]
fn admission_without_its_record_leaves_the_rule_inactive() {
    let kernel = Kernel::new();
    kernel.gate.submit(taxonomy("tweety", "bird")).unwrap();
    let rule = kernel.gate.compile_rule(BIRD_REPTILE).unwrap();
    let approvals = kernel.approve(&admission_message(&rule.id), 2);
    let version = kernel.gate.rules().version();

    kernel.ledger_fails_after(0);
    let err = kernel.gate.admit_rule(rule.clone(), &approvals).unwrap_err();
    assert!(matches!(err, GateError::Halted { .. }));
    assert!(kernel.gate.rules().snapshot().get(&rule.id).is_none());
    assert_eq!(kernel.gate.rules().version(), version);
    assert_eq!(kernel.ledger_len(), 1);

    kernel.heal_ledger();
    kernel.gate.recover().unwrap();
    let (id, record) = kernel.gate.admit_rule(rule, &approvals).unwrap();
    assert_eq!(kernel.gate.rules().version(), version + 1);
    let (records, _) = kernel.gate.export(record.index, record.index + 1).unwrap();
    assert_eq!(records[0].subject, format!("rule:{}", id.0.to_hex()));
}

#[test]
fn accepted_claim_the_store_cannot_take_halts_the_kernel() {
    let kernel = Kernel::new();
    kernel.fail_store_writes(true);

    let err = kernel.gate.submit(taxonomy("tom", "mammal")).unwrap_err();
    assert!(matches!(err, GateError::Store(StoreError::Journal(_))));
    let status = kernel.gate.status();
    assert!(status.halted);
    assert_eq!(status.ledger_len, 1);
    assert_eq!(status.propositions, 0);

    kernel.fail_store_writes(false);
    assert!(matches!(
        kernel.gate.submit(taxonomy("rex", "mammal")),
        Err(GateError::Halted { last_verified_index: Some(0) })
    ));
    assert_eq!(kernel.ledger_len(), 1);

    kernel.gate.recover().unwrap();
    assert!(kernel.gate.submit(taxonomy("rex", "mammal")).unwrap().0.is_accept());
    assert_eq!(kernel.gate.status().propositions, 1);
}
