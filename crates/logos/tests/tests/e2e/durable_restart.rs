//! E2E: a file-backed kernel comes back with its facts, rules, ledger and
//! override mode intact.

use logos_gate::CommandGate;
use logos_override::OverrideMode;
use logos_rules::admission_message;
use logos_tests::{council_keys, kernel_config, taxonomy};
use logos_types::Approval;

#[test]
fn restart_preserves_kernel_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = kernel_config().with_data_dir(dir.path());

    let (rule_id, head) = {
        let gate = CommandGate::open(config.clone()).unwrap();
        gate.submit(taxonomy("tom", "mammal")).unwrap();
        gate.submit(taxonomy("tom", "fish")).unwrap();

        let rule = gate
            .compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#)
            .unwrap();
        let message = admission_message(&rule.id);
        let approvals: Vec<Approval> = council_keys()[..2].iter().map(|k| Approval::sign(k, &message)).collect();
        let (rule_id, _) = gate.admit_rule(rule, &approvals).unwrap();
        (rule_id, gate.status().head_hash)
    };

    let gate = CommandGate::open(config).unwrap();
    let status = gate.status();
    assert_eq!(status.propositions, 1);
    assert_eq!(status.ledger_len, 4);
    assert_eq!(status.head_hash, head);
    assert_eq!(status.mode, OverrideMode::Suspended);
    assert!(gate.rules().snapshot().get(&rule_id).is_some());
    assert!(gate.verify_ledger(0, status.ledger_len).unwrap().intact);

    let (verdict, _) = gate.submit(taxonomy("tom", "fish")).unwrap();
    assert!(!verdict.is_accept());
}
