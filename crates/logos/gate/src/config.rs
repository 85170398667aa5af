use logos_engine::EngineConfig;
use logos_journal::SyncMode;
use logos_override::OverrideConfig;
use logos_rules::{RuleSetConfig, Vocabulary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::GateError;

/// Policy Council membership.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilConfig {
    /// Hex-encoded ed25519 verifying keys.
    pub members: Vec<String>,
    /// Distinct valid approvals required (default: 1)
    pub quorum: usize,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            quorum: 1,
        }
    }
}

/// Where the kernel keeps its journals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the proposition, rule and proof journals. Volatile
    /// when unset.
    pub data_dir: Option<PathBuf>,
    pub sync: SyncMode,
}

impl StorageConfig {
    pub fn propositions_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("propositions.journal"))
    }

    pub fn rules_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("rules.journal"))
    }

    pub fn proofs_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("proofs.journal"))
    }
}

/// Complete kernel configuration, loadable from TOML.
///
/// ```toml
/// axioms = ['RULE "disjoint" { DOMAIN taxonomy PRIORITY 9 EXCLUSIVE is_a { mammal fish } }']
///
/// [council]
/// members = ["8a88e3dd...", "..."]
/// quorum = 2
///
/// [vocabulary]
/// domains = ["taxonomy"]
/// predicates = ["is_a"]
/// terms = ["mammal", "fish"]
///
/// [override]
/// threshold = 8.0
/// decay = { kind = "sliding_window", window_secs = 300 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Rule text installed at startup without council approval.
    pub axioms: Vec<String>,
    /// Hex ed25519 seed of the key that seals ledger records.
    pub seal_key: Option<String>,
    pub council: CouncilConfig,
    pub vocabulary: Vocabulary,
    pub rules: RuleSetConfig,
    pub engine: EngineConfig,
    #[serde(rename = "override")]
    pub override_control: OverrideConfig,
    pub storage: StorageConfig,
}

impl KernelConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, GateError> {
        toml::from_str(text).map_err(|e| GateError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GateError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, GateError> {
        toml::to_string(self).map_err(|e| GateError::Config(e.to_string()))
    }

    pub fn with_council<S: AsRef<str>>(mut self, members: &[S], quorum: usize) -> Self {
        self.council = CouncilConfig {
            members: members.iter().map(|m| m.as_ref().to_string()).collect(),
            quorum,
        };
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_axiom(mut self, rule_text: impl Into<String>) -> Self {
        self.axioms.push(rule_text.into());
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_override(mut self, config: OverrideConfig) -> Self {
        self.override_control = config;
        self
    }

    pub fn with_rules(mut self, rules: RuleSetConfig) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = Some(dir.into());
        self
    }

    pub fn with_seal_key(mut self, seed_hex: impl Into<String>) -> Self {
        self.seal_key = Some(seed_hex.into());
        self
    }
}
