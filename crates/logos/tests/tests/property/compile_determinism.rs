//! Property tests: compiling the same rule text twice yields the same rule,
//! whenever it is compiled.

use chrono::{TimeZone, Utc};
use logos_rules::RuleCompiler;
use logos_tests::vocabulary;
use logos_types::ManualClock;
use proptest::prelude::*;
use std::sync::Arc;

fn arb_rule_text() -> impl Strategy<Value = String> {
    let exclusive = (
        "[a-z][a-z0-9 -]{0,20}",
        0u32..100,
        proptest::sample::subsequence(vec!["cat", "mammal", "fish", "bird", "reptile", "animal"], 2..=4),
    )
        .prop_map(|(name, priority, objects)| {
            format!(
                r#"RULE "{name}" {{ DOMAIN taxonomy PRIORITY {priority} EXCLUSIVE is_a {{ {} }} }}"#,
                objects.join(" ")
            )
        });
    let survival = ("[a-z]{1,12}", 0u32..100, 1u32..50).prop_map(|(name, priority, ratio)| {
        format!(r#"RULE "{name}" {{ DOMAIN economy PRIORITY {priority} SURVIVAL extract RATIO {ratio}.5 }}"#)
    });
    let require = ("[a-z]{1,12}", 0u32..100, 0u32..10).prop_map(|(name, priority, floor)| {
        format!(
            r#"RULE "{name}" {{ DOMAIN * PRIORITY {priority} REQUIRE confidence >= 0.{floor} AND NOT (source = rumor) }}"#
        )
    });
    prop_oneof![exclusive, survival, require]
}

proptest! {
    #[test]
    fn compile_is_deterministic(text in arb_rule_text(), gap_secs in 1i64..1_000_000) {
        let vocab = Arc::new(vocabulary());
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let compiler = RuleCompiler::new(vocab).with_clock(clock.clone());

        let first = compiler.compile(&text).unwrap();
        clock.advance(chrono::Duration::seconds(gap_secs));
        let second = compiler.compile(&text).unwrap();

        prop_assert_eq!(first.id, second.id);
        prop_assert_eq!(&first.definition, &second.definition);
        prop_assert_ne!(first.provenance.compiled_at, second.provenance.compiled_at);
        prop_assert!(first.is_intact() && second.is_intact());
    }
}
