#![deny(unsafe_code)]
//! Logos demo binary.
//!
//! Walks an in-memory kernel through the life of a small taxonomy and
//! economy policy:
//! 1. Disjoint categories and derived contradictions
//! 2. Survival-ratio commands
//! 3. Suspension, strict mode and a council reset
//! 4. Rule admission under quorum
//! 5. Proof chain verification and export
//!
//! Set `RUST_LOG=debug` to watch the kernel's own logging.

use ed25519_dalek::SigningKey;
use logos_engine::Verdict;
use logos_gate::{CommandGate, KernelConfig};
use logos_ledger::ProofRecordId;
use logos_override::{OverrideConfig, ResetRequest};
use logos_rules::{admission_message, Vocabulary};
use logos_types::{Approval, Candidate, Command, DeclaredEffect, IntentTag, Proposition, Triple};
use tracing_subscriber::EnvFilter;

const AXIOMS: &str = r#"
    RULE "mammal-fish-exclusive" {
        DOMAIN taxonomy
        PRIORITY 9
        OBLIGATION "categories mammal and fish are disjoint"
        EXCLUSIVE is_a { mammal fish }
    }
    RULE "cats are mammals"    { DOMAIN taxonomy PRIORITY 5 IMPLIES is_a cat -> is_a mammal CONFIDENCE 0.95 }
    RULE "mammals are animals" { DOMAIN taxonomy PRIORITY 4 IMPLIES is_a mammal -> is_a animal }
    RULE "no extraction"       { DOMAIN economy  PRIORITY 10 SURVIVAL extract RATIO 2.0 }
"#;

type DemoResult<T> = Result<T, Box<dyn std::error::Error>>;

// ── Formatting Helpers ──────────────────────────────────────────────────

fn section(title: &str) {
    println!();
    println!(" ┌{}┐", "─".repeat(60));
    println!(" │  {:<58}│", title);
    println!(" └{}┘", "─".repeat(60));
}

fn info(msg: &str) {
    println!("   [--]  {msg}");
}

fn show(label: &str, verdict: &Verdict, record: &ProofRecordId) {
    let tag = if verdict.is_accept() { "[OK]" } else { "[!!]" };
    println!("   {tag}  {label}  ->  {record}");
    for line in verdict.render().lines() {
        println!("         {line}");
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// Demo council: three deterministic keys, two signatures required.
fn council() -> Vec<SigningKey> {
    (1u8..=3).map(|n| SigningKey::from_bytes(&[n; 32])).collect()
}

fn approvals(message: &[u8], signers: usize) -> Vec<Approval> {
    council().iter().take(signers).map(|k| Approval::sign(k, message)).collect()
}

fn demo_config() -> KernelConfig {
    let members: Vec<String> = council()
        .iter()
        .map(|k| hex::encode(k.verifying_key().as_bytes()))
        .collect();
    let vocabulary = Vocabulary::standard()
        .with_domains(&["taxonomy", "economy"])
        .with_predicates(&["is_a"])
        .with_terms(&["cat", "mammal", "fish", "animal", "bird", "reptile"])
        .with_intents(&["extract", "invest"]);
    KernelConfig::default()
        .with_council(&members, 2)
        .with_vocabulary(vocabulary)
        .with_axiom(AXIOMS)
        .with_override(OverrideConfig::default().with_threshold(25.0))
        .with_seal_key(hex::encode([42u8; 32]))
}

fn taxonomy(subject: &str, category: &str) -> DemoResult<Proposition> {
    Ok(Proposition::builder(Triple::new(subject, "is_a", category)?, "taxonomy")
        .source("demo-survey")
        .build()?)
}

fn extraction(magnitude: f64, benefit: f64) -> DemoResult<Command> {
    Ok(Command::new(IntentTag::new("extract")?, "economy").with_effect(DeclaredEffect::new(magnitude, benefit)?))
}

fn submit(gate: &CommandGate, label: &str, candidate: impl Into<Candidate>) -> DemoResult<Verdict> {
    let (verdict, record) = gate.submit(candidate)?;
    show(label, &verdict, &record);
    Ok(verdict)
}

fn status(gate: &CommandGate) {
    let s = gate.status();
    info(&format!(
        "mode={}  severity={:.1}/{:.1}  ledger={}  rules={} (v{})  propositions={}",
        s.mode, s.severity, s.threshold, s.ledger_len, s.active_rules, s.rules_version, s.propositions
    ));
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!();
    println!("  Logos: deterministic command and claim validation");

    if let Err(e) = run_demo() {
        eprintln!();
        eprintln!("   [FATAL]  Demo failed: {e}");
        std::process::exit(1);
    }

    println!();
    println!("  Demo complete.");
    println!();
}

fn run_demo() -> DemoResult<()> {
    let config = demo_config();
    let gate = CommandGate::open(config.clone())?;
    section("Configuration");
    for line in config.to_toml_string()?.lines().filter(|l| l.starts_with('[')) {
        info(line);
    }
    status(&gate);

    section("1. Disjoint categories");
    submit(&gate, "cats is_a mammal", taxonomy("cats", "mammal")?)?;
    submit(&gate, "cats is_a fish", taxonomy("cats", "fish")?)?;
    submit(&gate, "felix is_a cat", taxonomy("felix", "cat")?)?;
    status(&gate);

    section("2. Survival ratio");
    submit(&gate, "extract 1.0 for 1.0", extraction(1.0, 1.0)?)?;
    submit(&gate, "extract 5.0 for 1.0", extraction(5.0, 1.0)?)?;
    status(&gate);

    section("3. Suspension and reset");
    submit(&gate, "felix is_a fish", taxonomy("felix", "fish")?)?;
    status(&gate);
    submit(&gate, "tweety is_a bird (suspended)", taxonomy("tweety", "bird")?)?;

    let reason = "operator reviewed the refusals";
    let challenge = gate.reset_challenge(reason)?;
    match gate.reset_override(&ResetRequest::new(reason, approvals(&challenge, 1))) {
        Ok(_) => info("single signature accepted (unexpected)"),
        Err(e) => info(&format!("reset with one signature refused: {e}")),
    }
    let record = gate.reset_override(&ResetRequest::new(reason, approvals(&challenge, 2)))?;
    info(&format!("reset with quorum recorded as {record}"));
    status(&gate);

    section("4. Rule admission");
    let rule = gate.compile_rule(r#"RULE "bird-reptile" { DOMAIN taxonomy PRIORITY 6 EXCLUSIVE is_a { bird reptile } }"#)?;
    let message = admission_message(&rule.id);
    let (rule_id, record) = gate.admit_rule(rule, &approvals(&message, 2))?;
    info(&format!("admitted {rule_id} as {record}"));
    submit(&gate, "tweety is_a bird", taxonomy("tweety", "bird")?)?;
    submit(&gate, "tweety is_a reptile", taxonomy("tweety", "reptile")?)?;

    section("5. Proof chain");
    let len = gate.status().ledger_len;
    let report = gate.verify_ledger(0, len)?;
    info(&format!("verified {} of {len} records, intact={}", report.checked, report.intact));
    let (records, _) = gate.export(0, len)?;
    for r in &records {
        info(&format!("#{:<3} {:<15} {}", r.index, r.kind.to_string(), r.subject));
    }
    Ok(())
}
