//! Declared vocabulary: the closed world of names rules may mention.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{CompileError, TermKind};
use crate::rule::ANY_DOMAIN;

/// Opposite-verb pairs recognized as direct contradictions.
pub const STANDARD_ANTONYMS: &[(&str, &str)] = &[
    ("builds", "destroys"),
    ("creates", "destroys"),
    ("strengthens", "weakens"),
    ("supports", "undermines"),
    ("helps", "harms"),
    ("improves", "degrades"),
    ("stabilizes", "destabilizes"),
    ("maintains", "breaks"),
];

fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Configuration form of a [`Vocabulary`]; normalized on conversion.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawVocabulary {
    domains: Vec<String>,
    predicates: Vec<String>,
    terms: Vec<String>,
    intents: Vec<String>,
    antonyms: Vec<(String, String)>,
}

impl From<RawVocabulary> for Vocabulary {
    fn from(raw: RawVocabulary) -> Self {
        let mut vocab = Vocabulary::new()
            .with_domains(&raw.domains)
            .with_predicates(&raw.predicates)
            .with_terms(&raw.terms)
            .with_intents(&raw.intents);
        for (a, b) in &raw.antonyms {
            vocab = vocab.with_antonyms(a, b);
        }
        vocab
    }
}

/// Domains, predicates, object terms, intent tags and antonym pairs.
///
/// Every name a rule references must be declared here or compilation fails.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawVocabulary")]
pub struct Vocabulary {
    domains: BTreeSet<String>,
    predicates: BTreeSet<String>,
    terms: BTreeSet<String>,
    intents: BTreeSet<String>,
    antonyms: BTreeSet<(String, String)>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty vocabulary seeded with [`STANDARD_ANTONYMS`].
    pub fn standard() -> Self {
        STANDARD_ANTONYMS
            .iter()
            .fold(Self::new(), |v, (a, b)| v.with_antonyms(a, b))
    }

    pub fn with_domains<S: AsRef<str>>(mut self, domains: &[S]) -> Self {
        self.domains.extend(domains.iter().map(|d| normalize(d.as_ref())));
        self
    }

    pub fn with_predicates<S: AsRef<str>>(mut self, predicates: &[S]) -> Self {
        self.predicates
            .extend(predicates.iter().map(|p| normalize(p.as_ref())));
        self
    }

    pub fn with_terms<S: AsRef<str>>(mut self, terms: &[S]) -> Self {
        self.terms.extend(terms.iter().map(|t| normalize(t.as_ref())));
        self
    }

    pub fn with_intents<S: AsRef<str>>(mut self, intents: &[S]) -> Self {
        self.intents.extend(intents.iter().map(|i| normalize(i.as_ref())));
        self
    }

    /// Declare two predicates as opposites. Both become declared predicates.
    pub fn with_antonyms(mut self, a: &str, b: &str) -> Self {
        let (a, b) = (normalize(a), normalize(b));
        self.predicates.insert(a.clone());
        self.predicates.insert(b.clone());
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.antonyms.insert(pair);
        self
    }

    /// Predicates declared opposite to `predicate`.
    pub fn antonyms_of<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.antonyms.iter().filter_map(move |(a, b)| {
            if a == predicate {
                Some(b.as_str())
            } else if b == predicate {
                Some(a.as_str())
            } else {
                None
            }
        })
    }

    pub fn are_antonyms(&self, a: &str, b: &str) -> bool {
        self.antonyms_of(a).any(|x| x == b)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    pub(crate) fn require(&self, kind: TermKind, term: &str) -> Result<String, CompileError> {
        let term = normalize(term);
        let declared = match kind {
            TermKind::Domain => term == ANY_DOMAIN || self.domains.contains(&term),
            TermKind::Predicate => self.predicates.contains(&term),
            TermKind::Term => self.terms.contains(&term),
            TermKind::Intent => self.intents.contains(&term),
        };
        if declared {
            Ok(term)
        } else {
            Err(CompileError::UndefinedTerm { kind, term })
        }
    }
}
