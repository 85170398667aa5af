use ed25519_dalek::SigningKey;
use logos_engine::{ContradictionEngine, Verdict};
use logos_journal::Journal;
use logos_ledger::{
    ChainReport, JournalLedgerStorage, LedgerStorage, MemoryLedgerStorage, ProofLedger, ProofRecord,
    ProofRecordId, RecordDraft, RecordKind,
};
use logos_override::{reset_message, OverrideController, ResetRequest, Transition};
use logos_rules::{ConstraintRule, RuleCompiler, RuleSet, StagedAdmission, Vocabulary};
use logos_store::{PropositionStore, StoreError};
use logos_types::{Approval, Candidate, Clock, PolicyCouncil, RuleId, SystemClock};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::KernelConfig;
use crate::error::GateError;
use crate::status::KernelStatus;

/// Assembles a [`CommandGate`] from a [`KernelConfig`].
pub struct CommandGateBuilder {
    config: KernelConfig,
    clock: Arc<dyn Clock>,
    ledger_storage: Option<Box<dyn LedgerStorage>>,
    store: Option<PropositionStore>,
}

impl CommandGateBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `storage` for the Proof Ledger instead of the configured one.
    pub fn ledger_storage(mut self, storage: Box<dyn LedgerStorage>) -> Self {
        self.ledger_storage = Some(storage);
        self
    }

    /// Use `store` instead of the configured Proposition Store.
    pub fn store(mut self, store: PropositionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<CommandGate, GateError> {
        let Self {
            config,
            clock,
            ledger_storage,
            store,
        } = self;
        let sync = config.storage.sync;

        let council = PolicyCouncil::from_hex_keys(&config.council.members, config.council.quorum)?;
        let vocabulary = Arc::new(config.vocabulary.clone());
        let compiler = RuleCompiler::new(vocabulary.clone()).with_clock(clock.clone());

        let mut axioms = Vec::new();
        for text in &config.axioms {
            axioms.extend(compiler.compile_all(text)?);
        }
        let mut rules = RuleSet::new(council, config.rules.clone()).with_axioms(axioms)?;
        if let Some(path) = config.storage.rules_path() {
            rules = rules.with_journal(Journal::open_file(path, sync)?)?;
        }

        let store = match (store, config.storage.propositions_path()) {
            (Some(store), _) => store,
            (None, Some(path)) => PropositionStore::open(Journal::open_file(path, sync)?)?,
            (None, None) => PropositionStore::new(),
        };

        let storage: Box<dyn LedgerStorage> = match (ledger_storage, config.storage.proofs_path()) {
            (Some(storage), _) => storage,
            (None, Some(path)) => Box::new(JournalLedgerStorage::open(Journal::open_file(path, sync)?)?),
            (None, None) => Box::new(MemoryLedgerStorage::new()),
        };
        let mut ledger = ProofLedger::open(storage)?.with_clock(clock.clone());
        if let Some(seed) = &config.seal_key {
            ledger = ledger.with_seal_key(parse_seal_key(seed)?)?;
        }

        let overrides = OverrideController::with_clock(config.override_control.clone(), clock.clone())?;
        restore_override(&ledger, &overrides)?;

        let engine = ContradictionEngine::new(vocabulary.clone(), config.engine.clone());
        info!(
            rules = rules.snapshot().len(),
            propositions = store.len(),
            ledger = ledger.len(),
            halted = ledger.is_halted(),
            mode = %overrides.mode(),
            "Command gate assembled"
        );

        Ok(CommandGate {
            config,
            vocabulary,
            compiler,
            engine,
            rules,
            store,
            overrides,
            commit: Mutex::new(ledger),
            clock,
        })
    }
}

/// Ledger subject for a rule: the full id, so records resolve unambiguously.
fn rule_subject(id: &RuleId) -> String {
    format!("rule:{}", id.0.to_hex())
}

fn parse_seal_key(seed_hex: &str) -> Result<SigningKey, GateError> {
    let bytes: [u8; 32] = hex::decode(seed_hex.trim())
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| GateError::Config("seal_key must be a 32-byte hex seed".into()))?;
    Ok(SigningKey::from_bytes(&bytes))
}

/// Re-enter Suspended mode if the newest override record is a suspension.
fn restore_override(ledger: &ProofLedger, overrides: &OverrideController) -> Result<(), GateError> {
    for index in (0..ledger.len()).rev() {
        let record = ledger.get(index)?;
        match record.kind {
            RecordKind::Transition => {
                overrides.resume_suspended(record.recorded_at);
                return Ok(());
            }
            RecordKind::Reset => return Ok(()),
            _ => {}
        }
    }
    Ok(())
}

/// The single entry point of the kernel.
///
/// Evaluation runs without locks against a rule snapshot and the store.
/// The ledger append, the store commit and the override update for one
/// candidate happen together under the commit lock, so ledger order matches
/// store insertion order. State changes only after their record is
/// appended; a change that fails after its append halts the ledger.
pub struct CommandGate {
    config: KernelConfig,
    vocabulary: Arc<Vocabulary>,
    compiler: RuleCompiler,
    engine: ContradictionEngine,
    rules: RuleSet,
    store: PropositionStore,
    overrides: OverrideController,
    commit: Mutex<ProofLedger>,
    clock: Arc<dyn Clock>,
}

impl CommandGate {
    pub fn builder(config: KernelConfig) -> CommandGateBuilder {
        CommandGateBuilder {
            config,
            clock: Arc::new(SystemClock),
            ledger_storage: None,
            store: None,
        }
    }

    pub fn open(config: KernelConfig) -> Result<Self, GateError> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn engine(&self) -> &ContradictionEngine {
        &self.engine
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn store(&self) -> &PropositionStore {
        &self.store
    }

    pub fn overrides(&self) -> &OverrideController {
        &self.overrides
    }

    fn ledger(&self) -> MutexGuard<'_, ProofLedger> {
        self.commit.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_running(ledger: &ProofLedger) -> Result<(), GateError> {
        if ledger.is_halted() {
            return Err(GateError::Halted {
                last_verified_index: ledger.last_verified_index(),
            });
        }
        Ok(())
    }

    /// Evaluate, ledger and answer one candidate.
    ///
    /// Accepted propositions are committed to the store. A refusal is a
    /// normal return; errors mean nothing was decided.
    pub fn submit(&self, candidate: impl Into<Candidate>) -> Result<(Verdict, ProofRecordId), GateError> {
        let candidate = candidate.into();
        let label = candidate.label();
        debug!(candidate = %label, "Candidate submitted");

        let mut verdict = self.engine.evaluate(&candidate, &self.rules.snapshot(), &self.store);

        let mut ledger = self.ledger();
        Self::ensure_running(&ledger)?;

        let rules = self.rules.snapshot();
        if verdict.basis.rules_version != rules.version() || verdict.basis.store_version != self.store.version() {
            debug!(candidate = %label, "Knowledge moved during evaluation; re-evaluating");
            verdict = self.engine.evaluate(&candidate, &rules, &self.store);
        }

        let severity = verdict.severity();
        let verdict = self.overrides.filter(verdict);
        if verdict.is_accept() {
            self.check_committable(&candidate)?;
        }
        let record = ledger.append_verdict(&verdict)?;

        if verdict.is_accept() {
            let now = self.clock.now();
            for proposition in candidate.propositions() {
                if let Err(e) = self.store.put(proposition.clone().ingested(now)) {
                    error!(
                        candidate = %label,
                        record = record.index,
                        error = %e,
                        "Accepted proposition could not be stored"
                    );
                    ledger.halt(format!("accepted record {} not committed to the store: {e}", record.index));
                    return Err(e.into());
                }
            }
        }

        if let Some(transition) = self.overrides.record(severity) {
            let transition_record = ledger.append(RecordDraft::transition("override", transition.to_string()))?;
            self.commit_transition(&mut ledger, &transition, &transition_record)?;
            warn!(
                record = transition_record.index,
                severity = transition.severity,
                "Override transition recorded"
            );
        }

        info!(
            candidate = %label,
            decision = ?verdict.decision,
            severity,
            record = record.index,
            "Verdict recorded"
        );
        Ok((verdict, record.id()))
    }

    fn commit_transition(
        &self,
        ledger: &mut ProofLedger,
        transition: &Transition,
        record: &ProofRecord,
    ) -> Result<(), GateError> {
        if let Err(e) = self.overrides.commit(transition) {
            error!(record = record.index, error = %e, "Ledgered override transition could not be applied");
            ledger.halt(format!("override transition at record {} not applied: {e}", record.index));
            return Err(e.into());
        }
        Ok(())
    }

    /// Reject accepted candidates the store could not take, before anything
    /// is ledgered.
    fn check_committable(&self, candidate: &Candidate) -> Result<(), GateError> {
        let mut seen = BTreeSet::new();
        for proposition in candidate.propositions() {
            if self.store.contains(&proposition.id) || !seen.insert(proposition.id) {
                return Err(StoreError::DuplicateId(proposition.id).into());
            }
            if let Some(missing) = proposition
                .superseded_ids()
                .find(|id| !self.store.contains(id) && !seen.contains(*id))
            {
                return Err(StoreError::UnknownSuperseded(*missing).into());
            }
        }
        Ok(())
    }

    /// Compile rule text against the kernel vocabulary. The council signs
    /// the resulting rule id.
    pub fn compile_rule(&self, text: &str) -> Result<ConstraintRule, GateError> {
        Ok(self.compiler.compile(text)?)
    }

    /// Admit a compiled rule on a council quorum.
    pub fn admit_rule(&self, rule: ConstraintRule, approvals: &[Approval]) -> Result<(RuleId, ProofRecordId), GateError> {
        let mut ledger = self.ledger();
        Self::ensure_running(&ledger)?;

        let name = rule.name().to_string();
        let staged = self.rules.stage_admit(rule, approvals)?;
        let record = ledger.append(RecordDraft::rule_admission(
            rule_subject(&staged.rule_id()),
            format!("admitted \"{name}\" at rule set version {}", staged.version()),
            approvals.to_vec(),
        ))?;
        let id = self.publish(&mut ledger, staged, &record)?;
        info!(rule = %id, record = record.index, "Rule admission recorded");
        Ok((id, record.id()))
    }

    /// Replace an active rule with a new version on a council quorum.
    pub fn amend_rule(
        &self,
        previous: &RuleId,
        rule: ConstraintRule,
        approvals: &[Approval],
    ) -> Result<(RuleId, ProofRecordId), GateError> {
        let mut ledger = self.ledger();
        Self::ensure_running(&ledger)?;

        let name = rule.name().to_string();
        let staged = self.rules.stage_amend(previous, rule, approvals)?;
        let record = ledger.append(RecordDraft::rule_admission(
            rule_subject(&staged.rule_id()),
            format!("amended \"{name}\", superseding {}", rule_subject(previous)),
            approvals.to_vec(),
        ))?;
        let id = self.publish(&mut ledger, staged, &record)?;
        info!(rule = %id, previous = %previous, record = record.index, "Rule amendment recorded");
        Ok((id, record.id()))
    }

    fn publish(&self, ledger: &mut ProofLedger, staged: StagedAdmission, record: &ProofRecord) -> Result<RuleId, GateError> {
        match self.rules.publish(staged) {
            Ok(id) => Ok(id),
            Err(e) => {
                error!(record = record.index, error = %e, "Ledgered rule change could not be published");
                ledger.halt(format!("rule change at record {} not applied: {e}", record.index));
                Err(e.into())
            }
        }
    }

    /// The message council members sign to reset the override with
    /// `reason` at the current ledger head.
    pub fn reset_challenge(&self, reason: &str) -> Result<Vec<u8>, GateError> {
        let ledger = self.ledger();
        Ok(reset_message(reason, &ledger.head_hash()?))
    }

    /// Return the kernel to Normal mode on a council quorum.
    pub fn reset_override(&self, request: &ResetRequest) -> Result<ProofRecordId, GateError> {
        let mut ledger = self.ledger();
        Self::ensure_running(&ledger)?;

        let head = ledger.head_hash()?;
        let transition = self.overrides.authorize_reset(request, self.rules.council(), &head)?;
        let record = ledger.append(RecordDraft::reset(transition.to_string(), request.approvals.clone()))?;
        self.commit_transition(&mut ledger, &transition, &record)?;
        info!(record = record.index, reason = %request.reason, "Override reset recorded");
        Ok(record.id())
    }

    pub fn verify_ledger(&self, from: u64, to: u64) -> Result<ChainReport, GateError> {
        Ok(self.ledger().verify_chain(from, to)?)
    }

    /// Records `[from, to)` in chain order, up to the first record that
    /// fails verification.
    pub fn export(&self, from: u64, to: u64) -> Result<(Vec<ProofRecord>, ChainReport), GateError> {
        Ok(self.ledger().export(from, to)?)
    }

    /// Operator action after a halt: re-verify the full chain and resume if
    /// it is intact.
    pub fn recover(&self) -> Result<ChainReport, GateError> {
        let mut ledger = self.ledger();
        let report = ledger.recover()?;
        info!(records = report.checked, "Kernel resumed after chain verification");
        Ok(report)
    }

    pub fn status(&self) -> KernelStatus {
        let overrides = self.overrides.status();
        let rules = self.rules.snapshot();
        let ledger = self.ledger();
        KernelStatus {
            mode: overrides.mode,
            severity: overrides.severity,
            threshold: overrides.threshold,
            last_transition: overrides.last_transition,
            ledger_len: ledger.len(),
            head_hash: ledger.head_hash().ok(),
            halted: ledger.is_halted(),
            last_verified_index: ledger.last_verified_index(),
            rules_version: rules.version(),
            active_rules: rules.len(),
            propositions: self.store.len(),
        }
    }
}
