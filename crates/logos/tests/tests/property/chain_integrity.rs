//! Property tests: the proof chain verifies after any sequence of appends,
//! and any single forged record is located.

use logos_ledger::{genesis_hash, ProofLedger, RecordDraft};
use logos_tests::{taxonomy, Kernel};
use proptest::prelude::*;

/// A submission drawn from a small world so both accepts and refusals occur.
fn arb_submission() -> impl Strategy<Value = (String, String)> {
    (
        prop_oneof![Just("tom"), Just("felix"), Just("nemo"), Just("tweety")],
        prop_oneof![Just("cat"), Just("mammal"), Just("fish"), Just("bird")],
    )
        .prop_map(|(s, o)| (s.to_string(), o.to_string()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn kernel_chain_verifies_after_any_submissions(
        submissions in proptest::collection::vec(arb_submission(), 0..24),
    ) {
        let kernel = Kernel::new();
        for (subject, object) in &submissions {
            kernel.gate.submit(taxonomy(subject, object)).unwrap();
        }
        let len = kernel.ledger_len();
        prop_assert!(len >= submissions.len() as u64);
        let report = kernel.gate.verify_ledger(0, len).unwrap();
        prop_assert!(report.intact);
        prop_assert_eq!(report.checked, len);
    }

    #[test]
    fn bare_ledger_links_every_record(notes in proptest::collection::vec("[a-z]{1,12}", 1..32)) {
        let mut ledger = ProofLedger::in_memory();
        let mut previous = genesis_hash();
        for note in &notes {
            let record = ledger.append(RecordDraft::transition("override", note.clone())).unwrap();
            prop_assert_eq!(record.prev_hash, previous);
            previous = record.hash;
        }
        prop_assert!(ledger.verify_chain(0, notes.len() as u64).unwrap().intact);
    }

    #[test]
    fn forged_record_is_located(count in 2usize..16, pick in any::<prop::sample::Index>()) {
        let kernel = Kernel::new();
        for i in 0..count {
            kernel.gate.submit(taxonomy(&format!("animal{i}"), "mammal")).unwrap();
        }
        let target = pick.index(count);
        kernel.tamper(target, |r| r.subject.push_str("-forged"));
        let report = kernel.gate.verify_ledger(0, count as u64).unwrap();
        prop_assert!(!report.intact);
        prop_assert_eq!(report.offending_index, Some(target as u64));
    }
}
