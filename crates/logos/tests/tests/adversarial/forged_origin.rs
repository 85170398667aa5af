//! Adversarial test: propositions whose origin signature does not match
//! their content are refused and never reach the store.

use ed25519_dalek::SigningKey;
use logos_engine::{Decision, EngineConfig, RefusalKind};
use logos_tests::{kernel_config, taxonomy, Kernel};
use logos_types::Proposition;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sensor_key() -> SigningKey {
    SigningKey::from_bytes(&[7; 32])
}

fn signed(subject: &str, category: &str) -> Proposition {
    let mut p = taxonomy(subject, category);
    p.sign(&sensor_key()).unwrap();
    p
}

fn strict_origin_kernel() -> Kernel {
    Kernel::with_config(kernel_config().with_engine(EngineConfig::default().with_signed_origin_required(true)))
}

fn assert_unverified(kernel: &Kernel, candidate: Proposition) {
    let (verdict, _) = kernel.gate.submit(candidate).unwrap();
    assert_eq!(verdict.decision, Decision::Refuse);
    assert_eq!(verdict.counterexample.unwrap().kind, RefusalKind::UnverifiedOrigin);
    assert!(kernel.gate.store().is_empty());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn edited_content_breaks_the_signature() {
    let kernel = Kernel::new();
    let mut forged = signed("tom", "mammal");
    forged.triple.object = "fish".into();
    assert_unverified(&kernel, forged);
}

#[test]
fn swapped_signer_breaks_the_signature() {
    let kernel = Kernel::new();
    let mut forged = signed("tom", "mammal");
    forged.origin.signer = Some(hex::encode(SigningKey::from_bytes(&[8; 32]).verifying_key().as_bytes()));
    assert_unverified(&kernel, forged);
}

#[test]
fn signature_without_signer_is_invalid() {
    let kernel = Kernel::new();
    let mut forged = signed("tom", "mammal");
    forged.origin.signer = None;
    assert_unverified(&kernel, forged);
}

#[test]
fn unsigned_claims_pass_unless_origin_is_required() {
    let lenient = Kernel::new();
    let (verdict, _) = lenient.gate.submit(taxonomy("tom", "mammal")).unwrap();
    assert!(verdict.is_accept());

    let strict = strict_origin_kernel();
    assert_unverified(&strict, taxonomy("tom", "mammal"));
}

#[test]
fn valid_signature_is_recorded_as_a_step() {
    let kernel = strict_origin_kernel();
    let (verdict, record) = kernel.gate.submit(signed("tom", "mammal")).unwrap();
    assert!(verdict.is_accept());
    assert!(verdict.steps.iter().any(|s| s.name == "origin"));

    let (records, _) = kernel.gate.export(record.index, record.index + 1).unwrap();
    assert!(records[0].steps.iter().any(|s| s.name == "origin"));
    assert_eq!(kernel.gate.store().len(), 1);
}

#[test]
fn forged_origin_counts_toward_suspension() {
    let kernel = Kernel::new();
    let mut forged = signed("tom", "mammal");
    forged.triple.object = "cat".into();
    kernel.gate.submit(forged).unwrap();
    assert!(kernel.gate.status().severity > 8.0);
}
