//! E2E: compiling, admitting and amending rules through the gate.

use logos_gate::GateError;
use logos_ledger::RecordKind;
use logos_rules::{admission_message, amendment_message, CompileError, TermKind};
use logos_tests::{taxonomy, Kernel};

#[test]
fn undefined_domain_fails_compilation_and_changes_nothing() {
    let kernel = Kernel::new();
    let version = kernel.gate.rules().version();
    let active = kernel.gate.rules().snapshot().len();

    let err = kernel
        .gate
        .compile_rule(r#"RULE "tides" { DOMAIN oceanography PRIORITY 3 EXCLUSIVE is_a { fish bird } }"#)
        .unwrap_err();
    match err {
        GateError::Compile(CompileError::UndefinedTerm { kind, term }) => {
            assert_eq!(kind, TermKind::Domain);
            assert_eq!(term, "oceanography");
        }
        other => panic!("expected undefined domain, got {other}"),
    }

    assert_eq!(kernel.gate.rules().version(), version);
    assert_eq!(kernel.gate.rules().snapshot().len(), active);
    assert_eq!(kernel.ledger_len(), 0);
}

#[test]
fn undefined_object_term_is_reported() {
    let kernel = Kernel::new();
    let err = kernel
        .gate
        .compile_rule(r#"RULE "x" { DOMAIN taxonomy PRIORITY 3 EXCLUSIVE is_a { fish dragon } }"#)
        .unwrap_err();
    assert!(matches!(
        err,
        GateError::Compile(CompileError::UndefinedTerm { kind: TermKind::Term, .. })
    ));
}

#[test]
fn admitted_rule_takes_effect_for_later_candidates() {
    let kernel = Kernel::new();
    kernel.gate.submit(taxonomy("tweety", "bird")).unwrap();

    let rule = kernel
        .gate
        .compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#)
        .unwrap();
    let approvals = kernel.approve(&admission_message(&rule.id), 2);
    let (id, record) = kernel.gate.admit_rule(rule, &approvals).unwrap();

    let (records, _) = kernel.gate.export(record.index, record.index + 1).unwrap();
    assert_eq!(records[0].kind, RecordKind::RuleAdmission);
    assert_eq!(records[0].subject, format!("rule:{}", id.0.to_hex()));

    let (verdict, _) = kernel.gate.submit(taxonomy("tweety", "reptile")).unwrap();
    assert_eq!(verdict.severity(), 6);
    assert_eq!(verdict.counterexample.unwrap().primary.rule, Some(id));
}

#[test]
fn amendment_retires_previous_version() {
    let kernel = Kernel::new();
    let v1 = kernel
        .gate
        .compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#)
        .unwrap();
    let (v1_id, _) = kernel
        .gate
        .admit_rule(v1.clone(), &kernel.approve(&admission_message(&v1.id), 2))
        .unwrap();

    let v2 = kernel
        .gate
        .compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 3 EXCLUSIVE is_a { bird reptile } }"#)
        .unwrap();
    let approvals = kernel.approve(&amendment_message(&v1_id, &v2.id), 2);
    let (v2_id, _) = kernel.gate.amend_rule(&v1_id, v2, &approvals).unwrap();

    let snapshot = kernel.gate.rules().snapshot();
    assert!(snapshot.get(&v1_id).is_none());
    assert!(snapshot.was_admitted(&v1_id));
    assert_eq!(snapshot.get(&v2_id).unwrap().provenance.supersedes, Some(v1_id));

    kernel.gate.submit(taxonomy("tweety", "bird")).unwrap();
    let (verdict, _) = kernel.gate.submit(taxonomy("tweety", "reptile")).unwrap();
    assert_eq!(verdict.severity(), 3);

    // The retired version cannot be amended again.
    let v3 = kernel
        .gate
        .compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 2 EXCLUSIVE is_a { bird reptile } }"#)
        .unwrap();
    let approvals = kernel.approve(&amendment_message(&v1_id, &v3.id), 2);
    assert!(kernel.gate.amend_rule(&v1_id, v3, &approvals).is_err());
}
