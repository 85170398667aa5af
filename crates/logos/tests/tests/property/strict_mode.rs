//! Property tests: once suspended, the kernel accepts nothing short of a
//! strict accept until a council reset is recorded.

use logos_engine::Decision;
use logos_ledger::RecordKind;
use logos_override::{OverrideMode, ResetRequest};
use logos_tests::{extraction, taxonomy, Kernel};
use logos_types::Candidate;
use proptest::prelude::*;

fn arb_candidate() -> impl Strategy<Value = Candidate> {
    prop_oneof![
        (
            prop_oneof![Just("tom"), Just("felix"), Just("nemo"), Just("rex")],
            prop_oneof![Just("cat"), Just("mammal"), Just("fish"), Just("bird"), Just("animal")],
        )
            .prop_map(|(s, o)| Candidate::from(taxonomy(s, o))),
        (0.0f64..20.0, 0.1f64..5.0).prop_map(|(m, b)| Candidate::from(extraction(m, b))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn suspended_kernel_only_strictly_accepts(
        candidates in proptest::collection::vec(arb_candidate(), 1..20),
        depth in 0usize..3,
    ) {
        let kernel = Kernel::with_depth(depth);
        kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
        kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
        prop_assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);

        for candidate in candidates {
            let (verdict, _) = match kernel.gate.submit(candidate) {
                Ok(outcome) => outcome,
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            };
            if verdict.decision == Decision::Accept {
                prop_assert!(verdict.uncertainty.is_none());
                prop_assert!(verdict.counterexample.is_none());
            }
            prop_assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);
        }

        let (records, report) = kernel.gate.export(0, kernel.ledger_len()).unwrap();
        prop_assert!(report.intact);
        prop_assert!(records.iter().all(|r| r.kind != RecordKind::Reset));
    }

    #[test]
    fn only_a_recorded_reset_lifts_suspension(
        hours in 1i64..48,
        signers in 0usize..=3,
    ) {
        let kernel = Kernel::new();
        kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
        kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
        kernel.clock.advance(chrono::Duration::hours(hours));
        prop_assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);

        let reason = "reviewed";
        let challenge = kernel.gate.reset_challenge(reason).unwrap();
        let before = kernel.ledger_len();
        let result = kernel.gate.reset_override(&ResetRequest::new(reason, kernel.approve(&challenge, signers)));

        if signers >= 2 {
            prop_assert!(result.is_ok());
            prop_assert_eq!(kernel.gate.status().mode, OverrideMode::Normal);
            prop_assert_eq!(kernel.ledger_len(), before + 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);
            prop_assert_eq!(kernel.ledger_len(), before);
        }
    }
}
