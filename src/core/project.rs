//! A loaded project: its root directory plus `.bullpen.toml`.

use std::path::{Path, PathBuf};

use crate::core::config::ProjectConfig;
use crate::core::constants;
use crate::core::env::Staging;
use crate::core::types::{EnvName, PolicyName, VersionId};
use crate::error::Result;

/// Remote namespace of a project: `<mount>/<group>/<name>/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectPath {
    pub group: String,
    pub name: String,
}

impl ProjectPath {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Secret path relative to the mount: `<group>/<name>/<env>/<id>`.
    pub fn secret_path(&self, env: &str, id: &str) -> String {
        format!("{}/{}/{}/{}", self.group, self.name, env, id)
    }

    /// Policy name for a tier: `<group>/<name>:<tier>`.
    pub fn policy_name(&self, tier: &str) -> PolicyName {
        format!("{}/{}:{}", self.group, self.name, tier)
    }
}

impl std::fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// A project on disk.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    /// Load the project rooted at `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = ProjectConfig::load(&root)?;
        Ok(Self { root, config })
    }

    /// Wrap an already validated configuration.
    pub fn new(root: impl AsRef<Path>, config: ProjectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn path(&self) -> ProjectPath {
        ProjectPath::new(&self.config.project.group, &self.config.project.name)
    }

    /// Mount point without surrounding slashes.
    pub fn mount_point(&self) -> &str {
        self.config.vault.mount_point.trim_matches('/')
    }

    /// Ordered environments: `local` first, then declared ones without duplicates.
    pub fn environments(&self) -> Vec<EnvName> {
        let mut envs = vec![constants::LOCAL_ENV.to_string()];
        for env in &self.config.project.environments {
            if !envs.contains(env) {
                envs.push(env.clone());
            }
        }
        envs
    }

    pub fn has_environment(&self, env: &str) -> bool {
        self.environments().iter().any(|e| e == env)
    }

    pub fn staging(&self) -> Staging {
        Staging::new(&self.root)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(constants::LEDGER_FILE)
    }

    /// KV path of a stored version, relative to the mount.
    pub fn secret_path(&self, env: &str, id: &VersionId) -> String {
        self.path().secret_path(env, id)
    }
}
