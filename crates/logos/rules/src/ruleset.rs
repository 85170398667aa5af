use logos_journal::Journal;
use logos_types::{Approval, PolicyCouncil, RuleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

use crate::error::RuleSetError;
use crate::rule::ConstraintRule;

const ADMIT_DOMAIN: &[u8] = b"logos-rule-admit-v1:";
const AMEND_DOMAIN: &[u8] = b"logos-rule-amend-v1:";

/// Message the council signs to admit `rule`.
pub fn admission_message(rule: &RuleId) -> Vec<u8> {
    let mut msg = ADMIT_DOMAIN.to_vec();
    msg.extend_from_slice(rule.0.as_bytes());
    msg
}

/// Message the council signs to replace `previous` with `next`.
pub fn amendment_message(previous: &RuleId, next: &RuleId) -> Vec<u8> {
    let mut msg = AMEND_DOMAIN.to_vec();
    msg.extend_from_slice(previous.0.as_bytes());
    msg.extend_from_slice(next.0.as_bytes());
    msg
}

/// Rule Set configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSetConfig {
    /// Reject a rule whose (domain, priority) is already held by an active
    /// rule. When off, both are kept and the more recent admission wins ties.
    pub strict_priority: bool,
}

impl RuleSetConfig {
    pub fn with_strict_priority(mut self, strict: bool) -> Self {
        self.strict_priority = strict;
        self
    }
}

/// Immutable view of the active rules at one version.
#[derive(Debug, Default)]
pub struct RuleSnapshot {
    version: u64,
    /// Active rules in admission order.
    active: Vec<Arc<ConstraintRule>>,
    /// Every rule id ever admitted, retired ones included.
    admitted: BTreeSet<RuleId>,
}

impl RuleSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn active(&self) -> &[Arc<ConstraintRule>] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn get(&self, id: &RuleId) -> Option<&Arc<ConstraintRule>> {
        self.active.iter().find(|r| r.id == *id)
    }

    pub fn was_admitted(&self, id: &RuleId) -> bool {
        self.admitted.contains(id)
    }

    /// Active rules applying to any of `domains`, highest priority first.
    /// Equal priorities are ordered most recent admission first.
    pub fn in_scope<'a>(&self, domains: impl IntoIterator<Item = &'a str>) -> Vec<Arc<ConstraintRule>> {
        let domains: Vec<&str> = domains.into_iter().collect();
        let mut ranked: Vec<(usize, &Arc<ConstraintRule>)> = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, r)| domains.iter().any(|d| r.definition.applies_to(d)))
            .collect();
        ranked.sort_by(|(ia, a), (ib, b)| b.priority().cmp(&a.priority()).then(ib.cmp(ia)));
        ranked.into_iter().map(|(_, r)| r.clone()).collect()
    }

    fn with_admission(&self, rule: ConstraintRule, retires: Option<RuleId>) -> Self {
        let mut active: Vec<Arc<ConstraintRule>> = self
            .active
            .iter()
            .filter(|r| Some(r.id) != retires)
            .cloned()
            .collect();
        let mut admitted = self.admitted.clone();
        admitted.insert(rule.id);
        active.push(Arc::new(rule));
        Self {
            version: self.version + 1,
            active,
            admitted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AdmissionEntry {
    rule: ConstraintRule,
    retires: Option<RuleId>,
}

impl AdmissionEntry {
    /// The message the council signed for this entry.
    fn approval_message(&self) -> Vec<u8> {
        match &self.retires {
            None => admission_message(&self.rule.id),
            Some(previous) => amendment_message(previous, &self.rule.id),
        }
    }
}

/// A council-approved rule change that is not active yet.
///
/// Produced by [`RuleSet::stage_admit`] and [`RuleSet::stage_amend`], made
/// active by [`RuleSet::publish`]. Dropping it discards the change.
#[derive(Debug)]
pub struct StagedAdmission {
    entry: AdmissionEntry,
    version: u64,
}

impl StagedAdmission {
    pub fn rule_id(&self) -> RuleId {
        self.entry.rule.id
    }

    pub fn rule(&self) -> &ConstraintRule {
        &self.entry.rule
    }

    pub fn retires(&self) -> Option<RuleId> {
        self.entry.retires
    }

    /// Rule set version once published, if nothing else is admitted first.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// The process-wide Rule Set.
///
/// Readers take an `Arc<RuleSnapshot>` and evaluate without holding any
/// lock. Admission builds a new snapshot and swaps it in.
pub struct RuleSet {
    current: RwLock<Arc<RuleSnapshot>>,
    council: PolicyCouncil,
    config: RuleSetConfig,
    journal: Option<Mutex<Journal>>,
}

impl RuleSet {
    pub fn new(council: PolicyCouncil, config: RuleSetConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(RuleSnapshot::default())),
            council,
            config,
            journal: None,
        }
    }

    /// Install startup axioms. They come from trusted configuration and are
    /// neither quorum-checked nor journaled.
    pub fn with_axioms(self, axioms: Vec<ConstraintRule>) -> Result<Self, RuleSetError> {
        for rule in axioms {
            self.install(rule, None)?;
        }
        Ok(self)
    }

    /// Attach a journal and replay the admissions it holds. Every entry must
    /// still carry a valid council quorum.
    pub fn with_journal(mut self, journal: Journal) -> Result<Self, RuleSetError> {
        let entries: Vec<AdmissionEntry> = journal.replay()?;
        let replayed = entries.len();
        for entry in entries {
            if !entry.rule.is_intact() {
                return Err(RuleSetError::Tampered(entry.rule.id));
            }
            if let Err(e) = self
                .council
                .verify_quorum(&entry.approval_message(), &entry.rule.provenance.approvals)
            {
                warn!(rule = %entry.rule.id, error = %e, "Journaled rule lacks a council quorum");
                return Err(e.into());
            }
            self.install(entry.rule, entry.retires)?;
        }
        self.journal = Some(Mutex::new(journal));
        info!(replayed, version = self.version(), "Rule set journal attached");
        Ok(self)
    }

    pub fn council(&self) -> &PolicyCouncil {
        &self.council
    }

    /// Current snapshot. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }

    /// Admit a new rule with a quorum of council approvals.
    pub fn admit(&self, rule: ConstraintRule, approvals: &[Approval]) -> Result<RuleId, RuleSetError> {
        let staged = self.stage_admit(rule, approvals)?;
        self.publish(staged)
    }

    /// Replace the active rule `previous` with a new version.
    pub fn amend(
        &self,
        previous: &RuleId,
        rule: ConstraintRule,
        approvals: &[Approval],
    ) -> Result<RuleId, RuleSetError> {
        let staged = self.stage_amend(previous, rule, approvals)?;
        self.publish(staged)
    }

    /// Run every admission check for `rule` without changing the set.
    pub fn stage_admit(&self, mut rule: ConstraintRule, approvals: &[Approval]) -> Result<StagedAdmission, RuleSetError> {
        if !rule.is_intact() {
            return Err(RuleSetError::Tampered(rule.id));
        }
        if let Err(e) = self.council.verify_quorum(&admission_message(&rule.id), approvals) {
            warn!(rule = %rule.id, error = %e, "Rule admission refused");
            return Err(e.into());
        }
        rule.provenance.approvals = approvals.to_vec();
        self.stage(AdmissionEntry { rule, retires: None })
    }

    /// Run every amendment check without changing the set.
    pub fn stage_amend(
        &self,
        previous: &RuleId,
        mut rule: ConstraintRule,
        approvals: &[Approval],
    ) -> Result<StagedAdmission, RuleSetError> {
        if !rule.is_intact() {
            return Err(RuleSetError::Tampered(rule.id));
        }
        if let Err(e) = self
            .council
            .verify_quorum(&amendment_message(previous, &rule.id), approvals)
        {
            warn!(rule = %rule.id, previous = %previous, error = %e, "Rule amendment refused");
            return Err(e.into());
        }
        let prior_version = self
            .snapshot()
            .get(previous)
            .map(|r| r.provenance.version)
            .ok_or(RuleSetError::NotActive(*previous))?;

        rule.provenance.approvals = approvals.to_vec();
        rule.provenance.version = prior_version + 1;
        rule.provenance.supersedes = Some(*previous);
        self.stage(AdmissionEntry {
            rule,
            retires: Some(*previous),
        })
    }

    /// Journal a staged change and make it active.
    pub fn publish(&self, staged: StagedAdmission) -> Result<RuleId, RuleSetError> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let entry = staged.entry;
        self.check(&current, &entry.rule, entry.retires)?;
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .append(&entry)?;
        }
        Ok(Self::swap(&mut current, entry))
    }

    fn stage(&self, entry: AdmissionEntry) -> Result<StagedAdmission, RuleSetError> {
        let current = self.snapshot();
        self.check(&current, &entry.rule, entry.retires)?;
        Ok(StagedAdmission {
            entry,
            version: current.version() + 1,
        })
    }

    /// Install without quorum or journal: axioms and replayed entries.
    fn install(&self, rule: ConstraintRule, retires: Option<RuleId>) -> Result<RuleId, RuleSetError> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        self.check(&current, &rule, retires)?;
        Ok(Self::swap(&mut current, AdmissionEntry { rule, retires }))
    }

    fn check(&self, current: &RuleSnapshot, rule: &ConstraintRule, retires: Option<RuleId>) -> Result<(), RuleSetError> {
        if current.was_admitted(&rule.id) {
            return Err(RuleSetError::AlreadyAdmitted(rule.id));
        }
        if let Some(retired) = retires {
            if current.get(&retired).is_none() {
                return Err(RuleSetError::NotActive(retired));
            }
        }
        if self.config.strict_priority {
            if let Some(existing) = current.active().iter().find(|r| {
                Some(r.id) != retires && r.domain() == rule.domain() && r.priority() == rule.priority()
            }) {
                return Err(RuleSetError::PriorityConflict {
                    domain: rule.domain().to_string(),
                    priority: rule.priority(),
                    existing: existing.id,
                });
            }
        }
        Ok(())
    }

    fn swap(current: &mut Arc<RuleSnapshot>, entry: AdmissionEntry) -> RuleId {
        let id = entry.rule.id;
        let next = current.with_admission(entry.rule, entry.retires);
        info!(
            rule = %id,
            retires = ?entry.retires,
            version = next.version(),
            active = next.len(),
            "Rule admitted"
        );
        *current = Arc::new(next);
        id
    }
}
