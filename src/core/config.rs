//! Configuration file management.
//!
//! Handles the project file `.bullpen.toml`, the operator file
//! `~/.bullpen/config.toml`, and the `.gitignore` rules protecting staged
//! secrets.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::constants;
use crate::core::env::write_secure;
use crate::core::types::{EnvName, Username};
use crate::core::validation;
use crate::error::{ConfigError, Result};

/// Project configuration stored in `.bullpen.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identity and declared environments
    pub project: ProjectSection,
    /// Which credentials driver serves this project
    #[serde(default)]
    pub credentials: CredentialsSection,
    /// Secret store settings
    #[serde(default)]
    pub vault: VaultSection,
    /// Exported files of the legacy provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<LegacySection>,
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    pub group: String,
    pub name: String,
    /// Declared environments; `local` is implied and always first.
    #[serde(default)]
    pub environments: Vec<EnvName>,
}

/// `[credentials]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsSection {
    #[serde(default = "default_driver")]
    pub driver: String,
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            driver: default_driver(),
        }
    }
}

fn default_driver() -> String {
    "vault".to_string()
}

/// `[vault]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// Endpoint URL (`file:///path/to/store` for a local store)
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_mount_point")]
    pub mount_point: String,
    /// Renew the session token before operations
    #[serde(default)]
    pub auto_token_renewal: bool,
    /// Root-token escalations allowed per operation
    #[serde(default = "default_max_escalations")]
    pub max_escalations: u32,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            mount_point: default_mount_point(),
            auto_token_renewal: false,
            max_escalations: default_max_escalations(),
        }
    }
}

fn default_mount_point() -> String {
    constants::DEFAULT_MOUNT_POINT.to_string()
}

fn default_max_escalations() -> u32 {
    constants::DEFAULT_MAX_ESCALATIONS
}

/// `[legacy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySection {
    /// Directory holding `<environment>.env` exports, relative to the project root
    pub dir: PathBuf,
}

impl ProjectConfig {
    /// Minimal configuration for a project.
    pub fn new(group: &str, name: &str, environments: &[&str]) -> Self {
        Self {
            project: ProjectSection {
                group: group.to_string(),
                name: name.to_string(),
                environments: environments.iter().map(|e| e.to_string()).collect(),
            },
            credentials: CredentialsSection::default(),
            vault: VaultSection::default(),
            legacy: None,
        }
    }

    /// Path to the configuration file under a project root.
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(constants::CONFIG_FILE)
    }

    /// Load and validate `.bullpen.toml` from a project root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist,
    /// or `ConfigError::Parse` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::config_path(root);
        debug!(path = %path.display(), "loading project config");

        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;

        config.validate()?;
        Ok(config)
    }

    /// Save to `.bullpen.toml` under a project root.
    pub fn save(&self, root: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(Self::config_path(root), contents)?;
        Ok(())
    }

    /// Validate the configuration structure and contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` or `ConfigError::InvalidValue`.
    pub fn validate(&self) -> Result<()> {
        if self.project.group.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "project.group",
            }
            .into());
        }
        if self.project.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "project.name",
            }
            .into());
        }
        for part in [&self.project.group, &self.project.name] {
            if part.contains('/') || part.contains(':') {
                return Err(ConfigError::InvalidValue {
                    field: "project",
                    reason: format!("'{}' may not contain '/' or ':'", part),
                }
                .into());
            }
        }
        for env in &self.project.environments {
            validation::validate_env_name(env).map_err(|e| ConfigError::InvalidValue {
                field: "project.environments",
                reason: e.to_string(),
            })?;
        }
        if self.vault.mount_point.trim_matches('/').is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "vault.mount_point",
                reason: "cannot be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Operator credentials stored in `~/.bullpen/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<OperatorCredentials>,
}

/// `[vault]` section of the operator config.
#[derive(Clone, Serialize, Deserialize)]
pub struct OperatorCredentials {
    pub username: Username,
    pub password: String,
}

impl std::fmt::Debug for OperatorCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl GlobalConfig {
    /// Default location (`~/.bullpen/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
        Ok(home
            .join(constants::GLOBAL_DIR)
            .join(constants::GLOBAL_CONFIG_FILE))
    }

    /// Load from a path; a missing file yields an empty config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no operator config");
            return Ok(Self::default());
        }

        #[cfg(unix)]
        if let Err(e) = validation::validate_file_permissions(path, 0o600) {
            warn!("{}", e);
        }

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Ok(toml::from_str(&contents).map_err(ConfigError::Parse)?)
    }

    /// Save to a path with owner-only permissions.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        write_secure(path, &contents)
    }

    /// Configured username, if any.
    pub fn username(&self) -> Option<&str> {
        self.vault
            .as_ref()
            .map(|v| v.username.as_str())
            .filter(|u| !u.is_empty())
    }

    /// Store a username and password.
    pub fn set_credentials(&mut self, username: &str, password: &str) {
        self.vault = Some(OperatorCredentials {
            username: username.to_string(),
            password: password.to_string(),
        });
    }
}

/// Ensure `.gitignore` under `root` protects the staging directory.
///
/// Creates the file if missing and appends only the rules it lacks, under a
/// single header. Existing content is never rewritten.
///
/// # Returns
///
/// `true` if the file was created or changed.
///
/// # Errors
///
/// Returns error if file operations fail.
pub fn ensure_gitignore(root: &Path) -> Result<bool> {
    let gitignore = root.join(".gitignore");

    let existing = if gitignore.exists() {
        std::fs::read_to_string(&gitignore)?
    } else {
        String::new()
    };

    let missing: Vec<&str> = constants::GITIGNORE_ENTRIES
        .iter()
        .copied()
        .filter(|entry| !existing.lines().any(|l| l.trim() == *entry))
        .collect();

    if missing.is_empty() {
        return Ok(false);
    }

    let mut updated = existing.clone();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    if !existing
        .lines()
        .any(|l| l.trim() == constants::GITIGNORE_HEADER)
    {
        updated.push_str(constants::GITIGNORE_HEADER);
        updated.push('\n');
    }
    for entry in missing {
        updated.push_str(entry);
        updated.push('\n');
    }

    std::fs::write(gitignore, updated)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_config_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut config = ProjectConfig::new("acme", "api", &["staging", "production"]);
        config.vault.url = "file:///tmp/store".to_string();
        config.save(tmp.path()).unwrap();

        let loaded = ProjectConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.project.group, "acme");
        assert_eq!(loaded.project.environments, vec!["staging", "production"]);
        assert_eq!(loaded.vault.mount_point, "bullpen");
        assert_eq!(loaded.credentials.driver, "vault");
        assert_eq!(loaded.vault.max_escalations, 1);
    }

    #[test]
    fn test_project_config_missing() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            ProjectConfig::load(tmp.path()),
            Err(crate::error::Error::Config(ConfigError::NotFound))
        ));
    }

    #[test]
    fn test_project_config_defaults_from_minimal_toml() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(".bullpen.toml"),
            "[project]\ngroup = \"acme\"\nname = \"web\"\n",
        )
        .unwrap();

        let loaded = ProjectConfig::load(tmp.path()).unwrap();
        assert!(loaded.project.environments.is_empty());
        assert!(!loaded.vault.auto_token_renewal);
        assert!(loaded.legacy.is_none());
    }

    #[test]
    fn test_project_config_rejects_bad_values() {
        assert!(ProjectConfig::new("", "api", &[]).validate().is_err());
        assert!(ProjectConfig::new("acme", "a/b", &[]).validate().is_err());
        assert!(ProjectConfig::new("acme", "api", &["../x"]).validate().is_err());

        let mut config = ProjectConfig::new("acme", "api", &[]);
        config.vault.mount_point = "/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_global_config_roundtrip_and_missing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".bullpen").join("config.toml");

        let empty = GlobalConfig::load_from(&path).unwrap();
        assert!(empty.username().is_none());

        let mut config = GlobalConfig::default();
        config.set_credentials("jane", "correct-horse-battery-staple42");
        config.save_to(&path).unwrap();

        let loaded = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(loaded.username(), Some("jane"));
        assert!(!format!("{:?}", loaded).contains("staple"));
    }

    #[test]
    fn test_ensure_gitignore_creates_file() {
        let tmp = TempDir::new().unwrap();
        assert!(ensure_gitignore(tmp.path()).unwrap());

        let content = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        assert_eq!(content, "# bullpen environments\nenvs/\nenvs/*\n.env\n");
    }

    #[test]
    fn test_ensure_gitignore_appends_without_clobbering() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".gitignore"), "target/\n.env").unwrap();

        assert!(ensure_gitignore(tmp.path()).unwrap());
        let content = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        assert!(content.starts_with("target/\n.env\n"));
        assert_eq!(content.matches(".env").count(), 1);
        assert!(content.contains("envs/\n"));
    }

    #[test]
    fn test_ensure_gitignore_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        ensure_gitignore(tmp.path()).unwrap();
        let first = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();

        assert!(!ensure_gitignore(tmp.path()).unwrap());
        let second = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        assert_eq!(first, second);
    }
}
