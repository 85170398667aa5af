//! Adversarial test: tampering with the proof ledger is located and halts
//! the kernel; torn journal tails are tolerated, mid-log damage is not.

use logos_gate::{CommandGate, GateError};
use logos_journal::JournalError;
use logos_tests::{kernel_config, taxonomy, Kernel};
use logos_types::ContentHash;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn kernel_with(records: usize) -> Kernel {
    let kernel = Kernel::new();
    for i in 0..records {
        kernel.gate.submit(taxonomy(&format!("animal{i}"), "mammal")).unwrap();
    }
    kernel
}

fn durable_gate(dir: &Path, records: usize) {
    let gate = CommandGate::open(kernel_config().with_data_dir(dir)).unwrap();
    for i in 0..records {
        gate.submit(taxonomy(&format!("animal{i}"), "mammal")).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn forged_hash_is_located_at_its_index() {
    let kernel = kernel_with(10);
    kernel.tamper(5, |r| r.hash = ContentHash::hash(b"forged"));

    let report = kernel.gate.verify_ledger(0, 10).unwrap();
    assert!(!report.intact);
    assert_eq!(report.offending_index, Some(5));
    assert_eq!(report.checked, 5);

    let early = kernel.gate.verify_ledger(0, 5).unwrap();
    assert!(early.intact);
}

#[test]
fn export_stops_before_forged_record() {
    let kernel = kernel_with(8);
    kernel.tamper(3, |r| r.decision = None);

    let (records, report) = kernel.gate.export(0, 8).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(report.offending_index, Some(3));
}

#[test]
fn forged_tail_halts_the_kernel() {
    let kernel = kernel_with(3);
    kernel.tamper(2, |r| r.note = Some("rewritten".into()));

    let err = kernel.gate.submit(taxonomy("felix", "cat")).unwrap_err();
    assert!(matches!(err, GateError::Halted { last_verified_index: Some(1) }));
    assert_eq!(kernel.ledger_len(), 3);

    let status = kernel.gate.status();
    assert!(status.halted);
    assert!(!status.is_operational());

    // Nothing but recovery moves while halted.
    let rule = kernel
        .gate
        .compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#)
        .unwrap();
    assert!(matches!(kernel.gate.admit_rule(rule, &[]), Err(GateError::Halted { .. })));
    assert!(matches!(kernel.gate.recover(), Err(GateError::Halted { .. })));
}

#[test]
fn resealed_forgery_without_the_key_is_rejected() {
    let kernel = kernel_with(4);
    kernel.tamper(1, |r| {
        r.subject = "claim:forged".into();
        r.hash = r.compute_hash().unwrap();
    });

    let report = kernel.gate.verify_ledger(0, 4).unwrap();
    assert!(!report.intact);
    assert_eq!(report.offending_index, Some(1));
}

#[test]
fn torn_journal_tail_is_dropped_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    durable_gate(dir.path(), 4);

    let path = kernel_config().with_data_dir(dir.path()).storage.proofs_path().unwrap();
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    // A frame header promising more payload than was written.
    file.write_all(&200u32.to_le_bytes()).unwrap();
    file.write_all(&[0xAB; 4]).unwrap();
    file.write_all(b"{\"index\":4").unwrap();
    drop(file);

    let gate = CommandGate::open(kernel_config().with_data_dir(dir.path())).unwrap();
    let status = gate.status();
    assert_eq!(status.ledger_len, 4);
    assert!(!status.halted);
    assert!(gate.verify_ledger(0, 4).unwrap().intact);
    assert!(gate.submit(taxonomy("felix", "cat")).unwrap().0.is_accept());
}

#[test]
fn damaged_journal_body_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    durable_gate(dir.path(), 4);

    let path = kernel_config().with_data_dir(dir.path()).storage.proofs_path().unwrap();
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[12] ^= 0xFF;
    std::fs::write(&path, bytes).unwrap();

    let err = CommandGate::open(kernel_config().with_data_dir(dir.path())).err().unwrap();
    assert!(
        matches!(err, GateError::Journal(JournalError::Corruption { offset: 0, .. })),
        "{err}"
    );
}
