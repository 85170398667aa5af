use logos_types::{Polarity, Proposition};
use std::sync::Arc;

use crate::store::PropositionStore;

/// Field filter for [`PropositionStore::query`]. Unset fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropositionFilter {
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub object: Option<String>,
    pub domain: Option<String>,
    pub polarity: Option<Polarity>,
    pub include_superseded: bool,
}

impl PropositionFilter {
    /// Matches every active proposition.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl AsRef<str>) -> Self {
        self.subject = Some(subject.as_ref().trim().to_lowercase());
        self
    }

    pub fn predicate(mut self, predicate: impl AsRef<str>) -> Self {
        self.predicate = Some(predicate.as_ref().trim().to_lowercase());
        self
    }

    pub fn object(mut self, object: impl AsRef<str>) -> Self {
        self.object = Some(object.as_ref().trim().to_lowercase());
        self
    }

    pub fn domain(mut self, domain: impl AsRef<str>) -> Self {
        self.domain = Some(domain.as_ref().trim().to_lowercase());
        self
    }

    pub fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = Some(polarity);
        self
    }

    pub fn including_superseded(mut self) -> Self {
        self.include_superseded = true;
        self
    }

    pub fn matches(&self, p: &Proposition) -> bool {
        fn field(want: &Option<String>, have: &str) -> bool {
            want.as_deref().map_or(true, |w| w == have)
        }
        field(&self.subject, &p.triple.subject)
            && field(&self.predicate, &p.triple.predicate)
            && field(&self.object, &p.triple.object)
            && field(&self.domain, &p.domain)
            && self.polarity.map_or(true, |pol| pol == p.polarity)
    }
}

/// A restartable query. Each call to [`Query::iter`] starts a fresh pass
/// over the propositions present at that moment, in ingestion order.
pub struct Query<'a> {
    store: &'a PropositionStore,
    filter: PropositionFilter,
}

impl<'a> Query<'a> {
    pub(crate) fn new(store: &'a PropositionStore, filter: PropositionFilter) -> Self {
        Self { store, filter }
    }

    pub fn filter(&self) -> &PropositionFilter {
        &self.filter
    }

    pub fn iter(&self) -> QueryIter<'_> {
        QueryIter {
            store: self.store,
            filter: &self.filter,
            position: 0,
            end: self.store.len(),
        }
    }
}

impl<'q> IntoIterator for &'q Query<'_> {
    type Item = Arc<Proposition>;
    type IntoIter = QueryIter<'q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy cursor. Takes the read lock per step, never across steps, and stops
/// at the store length observed when the pass began.
pub struct QueryIter<'q> {
    store: &'q PropositionStore,
    filter: &'q PropositionFilter,
    position: usize,
    end: usize,
}

impl Iterator for QueryIter<'_> {
    type Item = Arc<Proposition>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.store.read();
        while self.position < self.end {
            let entry = &state.entries[self.position];
            self.position += 1;
            if !self.filter.include_superseded && state.superseded.contains(&entry.id) {
                continue;
            }
            if self.filter.matches(entry) {
                return Some(entry.clone());
            }
        }
        None
    }
}
