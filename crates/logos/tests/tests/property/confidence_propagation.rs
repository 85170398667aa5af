//! Property tests: a derived conclusion is never more confident than the
//! weakest premise or rule it rests on.

use ed25519_dalek::SigningKey;
use logos_engine::{ContradictionEngine, EngineConfig};
use logos_rules::{RuleCompiler, RuleSet, RuleSetConfig, Vocabulary};
use logos_types::{Confidence, PolicyCouncil, Proposition, Triple};
use proptest::prelude::*;
use std::sync::Arc;

fn chain_vocabulary() -> Arc<Vocabulary> {
    Arc::new(
        Vocabulary::new()
            .with_domains(&["taxonomy"])
            .with_predicates(&["is_a"])
            .with_terms(&["cat", "feline", "mammal", "animal"]),
    )
}

fn chain_rules(confidences: [f64; 3]) -> String {
    let links = [("cat", "feline"), ("feline", "mammal"), ("mammal", "animal")];
    links
        .iter()
        .zip(confidences)
        .enumerate()
        .map(|(i, ((from, to), c))| {
            format!(
                r#"RULE "link{i}" {{ DOMAIN taxonomy PRIORITY {p} IMPLIES is_a {from} -> is_a {to} CONFIDENCE {c:.3} }}"#,
                p = i + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn derived_confidence_is_bounded_by_every_link(
        premise in 0.0f64..=1.0,
        links in [0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0],
    ) {
        // Rule text carries three decimals.
        let links = links.map(|c| (c * 1000.0).round() / 1000.0);
        let vocabulary = chain_vocabulary();
        let rules = RuleCompiler::new(vocabulary.clone()).compile_all(&chain_rules(links)).unwrap();
        let council = PolicyCouncil::new(vec![SigningKey::from_bytes(&[1; 32]).verifying_key()], 1).unwrap();
        let snapshot = RuleSet::new(council, RuleSetConfig::default())
            .with_axioms(rules)
            .unwrap()
            .snapshot();

        let felix = Proposition::builder(Triple::new("felix", "is_a", "cat").unwrap(), "taxonomy")
            .confidence(Confidence::new(premise, "generated").unwrap())
            .build()
            .unwrap();
        let engine = ContradictionEngine::new(vocabulary, EngineConfig::default());
        let (derived, uncertainty) = engine.consequences(&felix, &snapshot);

        prop_assert!(uncertainty.is_none());
        prop_assert_eq!(derived.len(), 3);
        for d in &derived {
            let weakest_link = links[..d.depth].iter().cloned().fold(premise, f64::min);
            prop_assert!(d.confidence <= premise + 1e-12);
            prop_assert!(d.confidence <= weakest_link + 1e-12, "{} > {}", d.confidence, weakest_link);
        }
        let mut by_depth: Vec<_> = derived.iter().map(|d| (d.depth, d.confidence)).collect();
        by_depth.sort_by_key(|(depth, _)| *depth);
        for pair in by_depth.windows(2) {
            prop_assert!(pair[1].1 <= pair[0].1 + 1e-12);
        }
    }
}
