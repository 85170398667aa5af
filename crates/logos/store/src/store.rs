use logos_journal::Journal;
use logos_types::{Proposition, PropositionId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::query::{PropositionFilter, Query};

#[derive(Default)]
pub(crate) struct StoreState {
    pub(crate) entries: Vec<Arc<Proposition>>,
    index: HashMap<PropositionId, usize>,
    pub(crate) superseded: HashSet<PropositionId>,
}

impl StoreState {
    fn insert(&mut self, proposition: Proposition) -> Result<PropositionId, StoreError> {
        let id = proposition.id;
        if self.index.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        let superseded: Vec<PropositionId> = proposition.superseded_ids().copied().collect();
        if let Some(missing) = superseded.iter().find(|s| !self.index.contains_key(s)) {
            return Err(StoreError::UnknownSuperseded(*missing));
        }

        self.index.insert(id, self.entries.len());
        self.entries.push(Arc::new(proposition));
        self.superseded.extend(superseded);
        Ok(id)
    }
}

/// Append-only store of committed propositions.
pub struct PropositionStore {
    state: RwLock<StoreState>,
    journal: Option<Mutex<Journal>>,
}

impl PropositionStore {
    /// Volatile store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            journal: None,
        }
    }

    /// Durable store; replays every journaled proposition.
    pub fn open(journal: Journal) -> Result<Self, StoreError> {
        let mut state = StoreState::default();
        for proposition in journal.replay::<Proposition>()? {
            state.insert(proposition)?;
        }
        info!(propositions = state.entries.len(), "Proposition store opened");
        Ok(Self {
            state: RwLock::new(state),
            journal: Some(Mutex::new(journal)),
        })
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a proposition. Fails on a reused id or a dangling supersession.
    pub fn put(&self, proposition: Proposition) -> Result<PropositionId, StoreError> {
        let mut state = self.write();

        let id = proposition.id;
        if state.index.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        if let Some(missing) = proposition
            .superseded_ids()
            .find(|s| !state.index.contains_key(s))
        {
            return Err(StoreError::UnknownSuperseded(*missing));
        }

        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .append(&proposition)?;
        }

        let id = state.insert(proposition)?;
        debug!(proposition = %id, position = state.entries.len() - 1, "Proposition stored");
        Ok(id)
    }

    pub fn get(&self, id: &PropositionId) -> Result<Arc<Proposition>, StoreError> {
        let state = self.read();
        state
            .index
            .get(id)
            .map(|&pos| state.entries[pos].clone())
            .ok_or(StoreError::NotFound(*id))
    }

    pub fn contains(&self, id: &PropositionId) -> bool {
        self.read().index.contains_key(id)
    }

    pub fn is_superseded(&self, id: &PropositionId) -> bool {
        self.read().superseded.contains(id)
    }

    /// Lazy, restartable view over the propositions matching `filter`.
    pub fn query(&self, filter: PropositionFilter) -> Query<'_> {
        Query::new(self, filter)
    }

    /// Number of stored propositions, superseded ones included.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Monotonic write counter. Moves on every successful `put`.
    pub fn version(&self) -> u64 {
        self.len() as u64
    }
}

impl Default for PropositionStore {
    fn default() -> Self {
        Self::new()
    }
}
