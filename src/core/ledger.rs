//! Version ledger (`.bullpen-vault.toml`).
//!
//! Maps each environment to the version id believed live in the store. An
//! empty id means the environment was never pushed.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::core::types::{EnvName, VersionId};
use crate::error::{ConfigError, Result, SyncError};

/// One environment's entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub name: EnvName,
    #[serde(default)]
    pub id: VersionId,
    /// Last id a restricted actor was not allowed to replace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_id: Option<VersionId>,
}

impl LedgerEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: String::new(),
            prev_id: None,
        }
    }

    /// The live id, falling back to the parked one.
    pub fn effective_id(&self) -> Option<&str> {
        if !self.id.is_empty() {
            return Some(&self.id);
        }
        self.prev_id.as_deref().filter(|p| !p.is_empty())
    }
}

/// The whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    environments: Vec<LedgerEntry>,
}

impl Ledger {
    /// Fresh ledger with an empty id per environment.
    pub fn init<S: AsRef<str>>(envs: &[S]) -> Self {
        let mut ledger = Self::default();
        for env in envs {
            ledger.ensure(env.as_ref());
        }
        ledger
    }

    /// Load the ledger.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::LedgerMissing` if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading ledger");
        if !path.exists() {
            return Err(SyncError::LedgerMissing.into());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Ok(toml::from_str(&contents).map_err(ConfigError::Parse)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "ledger saved");
        Ok(())
    }

    /// Add an entry for `env` if it has none.
    pub fn ensure(&mut self, env: &str) {
        if self.entry(env).is_none() {
            self.environments.push(LedgerEntry::new(env));
        }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.environments
    }

    pub fn entry(&self, env: &str) -> Option<&LedgerEntry> {
        self.environments.iter().find(|e| e.name == env)
    }

    /// Recorded id, empty when never pushed or unknown.
    pub fn id(&self, env: &str) -> &str {
        self.entry(env).map(|e| e.id.as_str()).unwrap_or("")
    }

    pub fn effective_id(&self, env: &str) -> Option<&str> {
        self.entry(env).and_then(LedgerEntry::effective_id)
    }

    /// True when no environment has ever been pushed.
    pub fn all_empty(&self) -> bool {
        self.environments.iter().all(|e| e.effective_id().is_none())
    }

    /// Record a new id for `env`.
    ///
    /// A writer replaces the id and clears any parked one. An actor that may
    /// not write `env` and records an empty id parks the current id in
    /// `prev_id` instead of discarding it.
    pub fn set_id(&mut self, env: &str, new_id: &str, writable: bool) {
        self.ensure(env);
        let Some(entry) = self.environments.iter_mut().find(|e| e.name == env) else {
            return;
        };

        if writable {
            entry.id = new_id.to_string();
            entry.prev_id = None;
        } else if new_id.is_empty() {
            if !entry.id.is_empty() {
                entry.prev_id = Some(std::mem::take(&mut entry.id));
            }
        } else {
            entry.id = new_id.to_string();
        }
    }
}
