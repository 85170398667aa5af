//! E2E: a claim that puts a subject in two disjoint categories is refused
//! with the committed claim and the exclusion rule as counterexample.

use logos_engine::{Decision, Premise, RefusalKind};
use logos_ledger::RecordKind;
use logos_tests::{taxonomy, Kernel};

#[test]
fn cats_cannot_be_fish() {
    let kernel = Kernel::new();
    let mammals = taxonomy("cats", "mammal");

    let (first, _) = kernel.gate.submit(mammals.clone()).unwrap();
    assert_eq!(first.decision, Decision::Accept);

    let (second, record) = kernel.gate.submit(taxonomy("cats", "fish")).unwrap();
    assert_eq!(second.decision, Decision::Refuse);

    let cx = second.counterexample.as_ref().unwrap();
    assert_eq!(cx.kind, RefusalKind::RuleViolation);
    assert_eq!(cx.premises.len(), 2);
    assert_eq!(cx.premises[0], Premise::proposition(&mammals));
    match &cx.premises[1] {
        Premise::Rule { name, priority, .. } => {
            assert_eq!(name, "mammal-fish-exclusive");
            assert_eq!(*priority, 9);
        }
        other => panic!("expected the exclusion rule, got {other}"),
    }

    let rendered = second.render();
    assert!(rendered.contains("cats is_a mammal"), "{rendered}");
    assert!(rendered.contains("mammal-fish-exclusive"), "{rendered}");

    let (records, report) = kernel.gate.export(record.index, record.index + 1).unwrap();
    assert!(report.intact);
    assert_eq!(records[0].kind, RecordKind::Verdict);
    assert_eq!(records[0].counterexample.as_ref(), Some(cx));
    assert_eq!(kernel.gate.store().len(), 1);
}

#[test]
fn derived_category_conflicts_are_refused_either_way() {
    for (first, second) in [("cat", "fish"), ("fish", "cat")] {
        let kernel = Kernel::new();
        kernel.gate.submit(taxonomy("felix", first)).unwrap();
        let (verdict, _) = kernel.gate.submit(taxonomy("felix", second)).unwrap();
        let cx = verdict.counterexample.expect("refused");
        assert_eq!(cx.kind, RefusalKind::IndirectContradiction);
        assert!(cx.premises.iter().any(|p| p.rule_id().is_some()));
    }
}

#[test]
fn accepted_verdict_carries_success_proof() {
    let kernel = Kernel::new();
    let felix = taxonomy("felix", "cat");
    let (verdict, _) = kernel.gate.submit(felix.clone()).unwrap();
    assert!(verdict.is_strict_accept());
    assert!(verdict.premises.contains(&Premise::proposition(&felix)));
    let outputs: Vec<&str> = verdict.steps.iter().map(|s| s.output.as_str()).collect();
    assert!(outputs.contains(&"felix is_a mammal"), "{outputs:?}");
    assert!(outputs.contains(&"felix is_a animal"), "{outputs:?}");
}
