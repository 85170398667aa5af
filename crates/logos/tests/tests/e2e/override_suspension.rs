//! E2E: refusals of priority-9 rules push the kernel into Suspended mode,
//! where only strictly compliant candidates pass until a council reset.

use logos_engine::{Decision, RefusalKind, Uncertainty};
use logos_ledger::RecordKind;
use logos_override::{OverrideConfig, OverrideMode, ResetRequest};
use logos_tests::{kernel_config, taxonomy, Kernel};
use std::time::Duration;

#[test]
fn ten_refusals_suspend_on_the_crossing_verdict() {
    let kernel = Kernel::with_depth(1);
    for i in 0..10 {
        let (verdict, _) = kernel.gate.submit(taxonomy(&format!("s{i}"), "mammal")).unwrap();
        assert!(verdict.is_strict_accept());
    }

    let mut transition_after = None;
    for i in 0..10 {
        let before = kernel.gate.status().mode;
        let (verdict, record) = kernel.gate.submit(taxonomy(&format!("s{i}"), "fish")).unwrap();
        assert_eq!(verdict.decision, Decision::Refuse);
        if before == OverrideMode::Normal && kernel.gate.status().mode == OverrideMode::Suspended {
            transition_after = Some((i, record.index));
        }
    }

    // 9 > 8 on the first refusal.
    let (crossing, index) = transition_after.expect("suspended");
    assert_eq!(crossing, 0);
    let (records, _) = kernel.gate.export(index, index + 2).unwrap();
    assert_eq!(records[0].kind, RecordKind::Verdict);
    assert_eq!(records[1].kind, RecordKind::Transition);
    assert_eq!(records[1].prev_hash, records[0].hash);

    let status = kernel.gate.status();
    assert_eq!(status.severity, 90.0);
    assert_eq!(status.mode, OverrideMode::Suspended);
}

#[test]
fn uncertain_accept_is_refused_only_because_suspended() {
    let kernel = Kernel::with_depth(1);

    let (before, _) = kernel.gate.submit(taxonomy("felix", "cat")).unwrap();
    assert!(before.is_accept());
    assert_eq!(before.uncertainty, Some(Uncertainty::DepthExhausted { depth: 1 }));

    kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);

    let (verdict, _) = kernel.gate.submit(taxonomy("garfield", "cat")).unwrap();
    assert_eq!(verdict.decision, Decision::Refuse);
    let cx = verdict.counterexample.as_ref().unwrap();
    assert_eq!(cx.kind, RefusalKind::Suspended);
    assert!(cx.secondary.is_empty());
    assert_eq!(verdict.uncertainty, Some(Uncertainty::DepthExhausted { depth: 1 }));
    assert_eq!(verdict.severity(), 0);
}

#[test]
fn reset_is_ledgered_and_restores_normal_policy() {
    let kernel = Kernel::with_depth(1);
    kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);

    let reason = "source of conflicting claims revoked";
    let challenge = kernel.gate.reset_challenge(reason).unwrap();
    let record = kernel
        .gate
        .reset_override(&ResetRequest::new(reason, kernel.approve(&challenge, 2)))
        .unwrap();

    let (records, report) = kernel.gate.export(0, kernel.ledger_len()).unwrap();
    assert!(report.intact);
    let reset = &records[record.index as usize];
    assert_eq!(reset.kind, RecordKind::Reset);
    assert_eq!(reset.approvals.len(), 2);

    let (verdict, _) = kernel.gate.submit(taxonomy("garfield", "cat")).unwrap();
    assert!(verdict.is_accept());
    assert!(verdict.uncertainty.is_some());
}

#[test]
fn severity_decays_out_of_the_window() {
    let config = kernel_config().with_override(
        OverrideConfig::default()
            .with_threshold(15.0)
            .with_sliding_window(Duration::from_secs(60)),
    );
    let kernel = Kernel::with_config(config);
    kernel.gate.submit(taxonomy("a", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("b", "mammal")).unwrap();

    kernel.gate.submit(taxonomy("a", "fish")).unwrap();
    kernel.clock.advance(chrono::Duration::seconds(61));
    kernel.gate.submit(taxonomy("b", "fish")).unwrap();

    let status = kernel.gate.status();
    assert_eq!(status.severity, 9.0);
    assert_eq!(status.mode, OverrideMode::Normal);

    kernel.gate.submit(taxonomy("b", "fish")).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);
}

#[test]
fn refusal_while_suspended_still_names_the_violated_rule() {
    let kernel = Kernel::new();
    let rex = taxonomy("rex", "mammal");
    kernel.gate.submit(rex.clone()).unwrap();
    kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
    assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);

    let (verdict, record) = kernel.gate.submit(taxonomy("rex", "fish")).unwrap();
    assert_eq!(verdict.decision, Decision::Refuse);
    assert_eq!(verdict.severity(), 9);
    let cx = verdict.counterexample.as_ref().unwrap();
    assert_eq!(cx.kind, RefusalKind::RuleViolation);
    assert!(cx.primary.rule.is_some());
    assert_eq!(cx.premises.len(), 2);
    assert_eq!(cx.premises[0].proposition_id(), Some(rex.id));

    let (records, _) = kernel.gate.export(record.index, record.index + 1).unwrap();
    assert_eq!(records[0].counterexample.as_ref(), Some(cx));
}

#[test]
fn accept_refused_while_suspended_cites_its_premises() {
    let kernel = Kernel::with_depth(1);
    kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
    kernel.gate.submit(taxonomy("tom", "fish")).unwrap();

    let (verdict, _) = kernel.gate.submit(taxonomy("garfield", "cat")).unwrap();
    let cx = verdict.counterexample.as_ref().unwrap();
    assert_eq!(cx.kind, RefusalKind::Suspended);
    assert!(!cx.premises.is_empty());
    assert_eq!(cx.premises, verdict.premises);
}
