//! Property tests: admission and reset without a valid council quorum always
//! fail and leave no trace.

use ed25519_dalek::{Signer, SigningKey};
use logos_gate::GateError;
use logos_override::{OverrideMode, ResetRequest};
use logos_rules::{admission_message, RuleSetError};
use logos_tests::{council_keys, outsider_key, taxonomy, Kernel};
use logos_types::Approval;
use proptest::prelude::*;

/// Ways a single approval can be worthless or redundant.
#[derive(Clone, Copy, Debug)]
enum Flaw {
    /// Valid, but always from the same member, so it never adds up to two.
    SoleMember,
    Outsider,
    WrongMessage,
    GarbageSignature,
    GarbageSigner,
    SignatureFromOtherMember,
}

fn arb_flaw() -> impl Strategy<Value = Flaw> {
    prop_oneof![
        Just(Flaw::SoleMember),
        Just(Flaw::Outsider),
        Just(Flaw::WrongMessage),
        Just(Flaw::GarbageSignature),
        Just(Flaw::GarbageSigner),
        Just(Flaw::SignatureFromOtherMember),
    ]
}

fn forge(flaw: Flaw, message: &[u8]) -> Approval {
    let members = council_keys();
    let signer_hex = |k: &SigningKey| hex::encode(k.verifying_key().as_bytes());
    match flaw {
        Flaw::SoleMember => Approval::sign(&members[0], message),
        Flaw::Outsider => Approval::sign(&outsider_key(), message),
        Flaw::WrongMessage => Approval::sign(&members[1], b"some other operation"),
        Flaw::GarbageSignature => Approval {
            signer: signer_hex(&members[1]),
            signature: "zz".repeat(64),
        },
        Flaw::GarbageSigner => Approval {
            signer: "not-a-key".into(),
            signature: hex::encode(members[1].sign(message).to_bytes()),
        },
        Flaw::SignatureFromOtherMember => Approval {
            signer: signer_hex(&members[2]),
            signature: hex::encode(members[1].sign(message).to_bytes()),
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn admission_without_quorum_fails(flaws in proptest::collection::vec(arb_flaw(), 0..8)) {
        let kernel = Kernel::new();
        let rule = kernel
            .gate
            .compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#)
            .unwrap();
        let message = admission_message(&rule.id);
        let approvals: Vec<Approval> = flaws.iter().map(|f| forge(*f, &message)).collect();
        let version = kernel.gate.rules().version();

        let result = kernel.gate.admit_rule(rule, &approvals);
        prop_assert!(
            matches!(result, Err(GateError::RuleSet(RuleSetError::Unauthorized(_)))),
            "{:?}",
            result
        );
        prop_assert_eq!(kernel.gate.rules().version(), version);
        prop_assert_eq!(kernel.ledger_len(), 0);
    }

    #[test]
    fn reset_without_quorum_fails(flaws in proptest::collection::vec(arb_flaw(), 0..8)) {
        let kernel = Kernel::new();
        kernel.gate.submit(taxonomy("tom", "mammal")).unwrap();
        kernel.gate.submit(taxonomy("tom", "fish")).unwrap();
        let before = kernel.ledger_len();

        let reason = "forged reset";
        let challenge = kernel.gate.reset_challenge(reason).unwrap();
        let approvals: Vec<Approval> = flaws.iter().map(|f| forge(*f, &challenge)).collect();
        let result = kernel.gate.reset_override(&ResetRequest::new(reason, approvals));

        prop_assert!(matches!(result, Err(GateError::Override(_))), "{:?}", result);
        prop_assert_eq!(kernel.gate.status().mode, OverrideMode::Suspended);
        prop_assert_eq!(kernel.ledger_len(), before);
    }
}
